//! HTTP endpoint handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::error;
use uuid::Uuid;

use crate::{
    services::{validate_timer_form, TimerForm},
    state::Timer,
};
use super::{
    responses::{AlertsResponse, ApiResponse, DismissResponse, HealthResponse, StatusResponse},
    ApiContext,
};

type TimerReply = Result<(StatusCode, Json<ApiResponse>), StatusCode>;

fn current_timers(ctx: &ApiContext) -> Result<Vec<Timer>, StatusCode> {
    ctx.state.timers().map_err(|e| {
        error!("Failed to read timers: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn ok(ctx: &ApiContext, message: String) -> TimerReply {
    Ok((StatusCode::OK, Json(ApiResponse::ok(message, current_timers(ctx)?))))
}

/// Run the validator (which alerts the user) and build the 422 reply on rejection
fn check_form(ctx: &ApiContext, form: &TimerForm) -> Option<TimerReply> {
    if ctx.state.validate_form(form) {
        return None;
    }

    let message = validate_timer_form(form)
        .err()
        .map(|reason| reason.to_string())
        .unwrap_or_default();
    Some(current_timers(ctx).map(|timers| {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::rejected(message, timers)))
    }))
}

/// Handle GET /timers - List timers in display order
pub async fn list_timers_handler(State(ctx): State<ApiContext>) -> TimerReply {
    let count = current_timers(&ctx)?.len();
    ok(&ctx, format!("{} timers", count))
}

/// Handle POST /timers - Validate a form and add a timer
pub async fn create_timer_handler(
    State(ctx): State<ApiContext>,
    Json(form): Json<TimerForm>,
) -> TimerReply {
    if let Some(rejection) = check_form(&ctx, &form) {
        return rejection;
    }

    let spec = form.into_spec().map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
    match ctx.state.add_timer(spec) {
        Ok(timer) => {
            let timers = current_timers(&ctx)?;
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(format!("Timer \"{}\" added", timer.title), timers)),
            ))
        }
        Err(e) => {
            error!("Failed to add timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle PUT /timers/:id - Validate a form and edit a timer
pub async fn edit_timer_handler(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<TimerForm>,
) -> TimerReply {
    if let Some(rejection) = check_form(&ctx, &form) {
        return rejection;
    }

    let updates = form.into_updates().map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
    match ctx.state.edit_timer(id, updates) {
        Ok(Some(timer)) => ok(&ctx, format!("Timer \"{}\" updated", timer.title)),
        Ok(None) => ok(&ctx, format!("No timer {}", id)),
        Err(e) => {
            error!("Failed to edit timer {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle DELETE /timers/:id - Remove a timer
pub async fn delete_timer_handler(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> TimerReply {
    match ctx.state.delete_timer(id) {
        Ok(true) => ok(&ctx, format!("Timer {} deleted", id)),
        Ok(false) => ok(&ctx, format!("No timer {}", id)),
        Err(e) => {
            error!("Failed to delete timer {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timers/:id/toggle - Start or pause a timer
pub async fn toggle_timer_handler(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> TimerReply {
    match ctx.state.toggle_timer(id) {
        Ok(Some(timer)) => {
            let verb = if timer.is_running { "started" } else { "paused" };
            ok(&ctx, format!("Timer \"{}\" {}", timer.title, verb))
        }
        Ok(None) => ok(&ctx, format!("No timer {}", id)),
        Err(e) => {
            error!("Failed to toggle timer {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timers/:id/restart - Reset a timer to its full duration
pub async fn restart_timer_handler(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> TimerReply {
    match ctx.state.restart_timer(id) {
        Ok(Some(timer)) => ok(&ctx, format!("Timer \"{}\" restarted", timer.title)),
        Ok(None) => ok(&ctx, format!("No timer {}", id)),
        Err(e) => {
            error!("Failed to restart timer {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /alerts - List alerts waiting to be dismissed
pub async fn alerts_handler(State(ctx): State<ApiContext>) -> Json<AlertsResponse> {
    Json(AlertsResponse { alerts: ctx.alerts.list() })
}

/// Handle POST /alerts/:id/dismiss - Dismiss an alert and stop its sound
pub async fn dismiss_alert_handler(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DismissResponse>, StatusCode> {
    if ctx.alerts.dismiss(id) {
        Ok(Json(DismissResponse { id, dismissed: true }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Handle GET /status - Return current service status
pub async fn status_handler(State(ctx): State<ApiContext>) -> Result<Json<StatusResponse>, StatusCode> {
    let timers = current_timers(&ctx)?;
    let (last_action, last_action_time) = ctx.state.get_last_action();

    Ok(Json(StatusResponse {
        timers: timers.len(),
        running: timers.iter().filter(|t| t.is_running).count(),
        expired: timers.iter().filter(|t| t.is_expired()).count(),
        uptime: ctx.state.get_uptime(),
        port: ctx.state.port,
        host: ctx.state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
