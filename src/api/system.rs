//! Health endpoint.
use crate::api::error::{api_internal, ApiError};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::extract::State;
use axum::Json;

/// `GET /v1/system/health`. Probes the backing store; no auth required.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: state.store.backend_name().to_string(),
    }))
}
