//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::auth;
use crate::auth::service::AuthService;
use crate::store::BackendStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub store: Arc<dyn BackendStore>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route("/auth/token", axum::routing::post(auth::handlers::login))
        .route(
            "/auth/refresh-token",
            axum::routing::post(auth::handlers::refresh_token),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/users",
            axum::routing::get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/v1/users/:id_user",
            axum::routing::get(api::users::get_user)
                .patch(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .route(
            "/v1/institutions",
            axum::routing::get(api::institutions::list_institutions)
                .post(api::institutions::create_institution),
        )
        .route(
            "/v1/institutions/:id_institution",
            axum::routing::get(api::institutions::get_institution)
                .delete(api::institutions::delete_institution),
        )
        .route(
            "/v1/institutions/:id_institution/members/:id_user",
            axum::routing::put(api::institutions::put_member)
                .delete(api::institutions::delete_member),
        )
        .route(
            "/v1/ppdas",
            axum::routing::get(api::ppdas::list_ppdas).post(api::ppdas::create_ppda),
        )
        .route(
            "/v1/ppdas/:id_ppda",
            axum::routing::patch(api::ppdas::update_ppda),
        )
        .layer(trace_layer)
        .with_state(state)
}
