//! User administration endpoints.
//!
//! Every route here is admin-only. Plaintext passwords are hashed before the
//! store sees them; responses never carry the stored hash.
use crate::api::error::{api_validation_error, ApiError};
use crate::api::types::{CreateUserRequest, UpdateUserRequest};
use crate::app::AppState;
use crate::auth::{gate, password};
use crate::model::{now_epoch_seconds, User, UserPatch};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

async fn require_admin_caller(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let caller = gate::current_user(&state.auth, headers).await?;
    gate::require_admin(&caller)?;
    Ok(caller)
}

/// `GET /v1/users`.
pub(crate) async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// `POST /v1/users`. Returns 201 with the created record.
pub(crate) async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    require_admin_caller(&state, &headers).await?;
    if body.username.trim().is_empty() || body.email.trim().is_empty() {
        return Err(api_validation_error("username and email must be non-empty"));
    }
    if body.password.is_empty() {
        return Err(api_validation_error("password must be non-empty"));
    }
    let password_hash = password::hash_secret(&body.password).map_err(ApiError::from)?;
    let now = now_epoch_seconds();
    let created = state
        .store
        .create_user(User {
            id_user: Uuid::new_v4().to_string(),
            username: body.username,
            email: body.email,
            password_hash,
            is_admin: body.is_admin,
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(id_user = %created.id_user, "user created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /v1/users/:id_user`.
pub(crate) async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_user): Path<String>,
) -> Result<Json<User>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    let user = state.store.get_user(&id_user).await?;
    Ok(Json(user))
}

/// `PATCH /v1/users/:id_user`. Absent fields are left untouched.
pub(crate) async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_user): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    let password_hash = match body.password.as_deref() {
        Some("") => return Err(api_validation_error("password must be non-empty")),
        Some(plain) => Some(password::hash_secret(plain).map_err(ApiError::from)?),
        None => None,
    };
    let updated = state
        .store
        .update_user(
            &id_user,
            UserPatch {
                username: body.username,
                email: body.email,
                password_hash,
                is_admin: body.is_admin,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// `DELETE /v1/users/:id_user`. Returns 204; refresh tokens and memberships
/// of the user go with it.
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_user): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin_caller(&state, &headers).await?;
    state.store.delete_user(&id_user).await?;
    tracing::info!(id_user = %id_user, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
