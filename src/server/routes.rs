use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::server::AppState;
use crate::service::{ListParams, ListResponse};
use crate::storage::StatisticsReport;
use crate::Error;

/// Request-layer failure rendered as a status code and a plain-text message
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_fault() {
            tracing::debug!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.0.to_string()).into_response()
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    Ok(Json(state.service.list(&params)?))
}

pub async fn create_log(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = state.service.create(&body)?;
    tracing::debug!(%id, "Accepted log entry");
    Ok(StatusCode::CREATED)
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatisticsReport>, ApiError> {
    Ok(Json(state.service.statistics()?))
}
