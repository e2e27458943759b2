//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{services::SoundConfig, storage::JsonFileStorage};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "multi-timer")]
#[command(about = "A persistent multi-timer service with expiry alerts")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the timer snapshot (defaults to ~/.local/share/multi-timer)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Keep timers in memory only, for this session
    #[arg(long)]
    pub ephemeral: bool,

    /// Ticking driver period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_millis: u64,

    /// Sound file looped when a timer ends
    #[arg(short, long)]
    pub sound: Option<PathBuf>,

    /// Command used to play the sound file
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Seconds an alert stays listed; a looping sound keeps it until dismissed
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub alert_ttl_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_ttl_secs)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(JsonFileStorage::default_dir)
    }

    /// Sound settings, if a sound file was given
    pub fn sound(&self) -> Option<SoundConfig> {
        self.sound
            .as_ref()
            .map(|file| SoundConfig::new(self.player.clone(), file.clone()))
    }
}
