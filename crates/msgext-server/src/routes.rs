use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use msgext_core::query::QUERY_INVOKE;
use msgext_core::{PlatformResponse, QueryHandler};
use serde_json::json;
use tracing::debug;

use crate::activity::Activity;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub handler: QueryHandler,
}

impl AppState {
    pub fn new(handler: QueryHandler) -> Self {
        Self { handler }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Bot Framework messaging endpoint.
///
/// Only `composeExtension/query` invokes do work; other invokes get 501 and
/// non-invoke activities are acknowledged with an empty 200.
pub async fn messages(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Result<Response, AppError> {
    if !activity.is_invoke() {
        debug!(kind = %activity.kind, "ignoring non-invoke activity");
        return Ok(StatusCode::OK.into_response());
    }
    if activity.invoke_name() != QUERY_INVOKE {
        debug!(name = activity.invoke_name(), "unhandled invoke");
        return Ok(StatusCode::NOT_IMPLEMENTED.into_response());
    }

    let query = activity
        .query()
        .map_err(|e| AppError::bad_request(format!("invalid query invoke: {e}")))?;
    let context = activity.turn_context(&query);
    let response = state.handler.handle_query(&context, &query).await?;
    Ok(platform_response(response.into_platform_response()?))
}

fn platform_response(platform: PlatformResponse) -> Response {
    let status =
        StatusCode::from_u16(platform.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match platform.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}
