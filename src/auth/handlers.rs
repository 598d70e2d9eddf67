//! Token endpoints: login and refresh-token rotation.
use super::gate;
use super::service::TokenPairResponse;
use crate::api::error::ApiError;
use crate::api::types::LoginForm;
use crate::app::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Form, Json};

/// `POST /auth/token`. Form-encoded credentials in, token pair out.
pub(crate) async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state.auth.login(&form.username, &form.password).await?;
    tracing::info!(username = %form.username, "login succeeded");
    Ok(Json(pair))
}

/// `POST /auth/refresh-token`. Bearer refresh token in, rotated pair out.
///
/// The presented token is consumed before the new pair is minted; replaying
/// it afterwards fails like any other invalid token.
pub(crate) async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let raw = gate::extract_bearer(&headers)?;
    let claims = state.auth.redeem_refresh(raw).await?;
    let pair = state.auth.refresh(&claims.sub).await?;
    Ok(Json(pair))
}
