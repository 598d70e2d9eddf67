//! Institution and membership administration endpoints.
//!
//! Admin-only. Membership assignment is an upsert keyed on (user,
//! institution); re-assigning changes role or active flag in place.
use crate::api::error::{api_validation_error, ApiError};
use crate::api::types::{CreateInstitutionRequest, MembershipRequest};
use crate::app::AppState;
use crate::auth::gate;
use crate::model::{now_epoch_seconds, Institution, UserInstitution};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

async fn require_admin_caller(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let caller = gate::current_user(&state.auth, headers).await?;
    gate::require_admin(&caller)?;
    Ok(())
}

/// `GET /v1/institutions`.
pub(crate) async fn list_institutions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Institution>>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    let institutions = state.store.list_institutions().await?;
    Ok(Json(institutions))
}

/// `POST /v1/institutions`. Returns 201 with the created record.
pub(crate) async fn create_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateInstitutionRequest>,
) -> Result<(StatusCode, Json<Institution>), ApiError> {
    require_admin_caller(&state, &headers).await?;
    if body.institution_name.trim().is_empty() {
        return Err(api_validation_error("institution_name must be non-empty"));
    }
    let now = now_epoch_seconds();
    let created = state
        .store
        .create_institution(Institution {
            id_institution: Uuid::new_v4().to_string(),
            institution_name: body.institution_name,
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(id_institution = %created.id_institution, "institution created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /v1/institutions/:id_institution`.
pub(crate) async fn get_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_institution): Path<String>,
) -> Result<Json<Institution>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    let institution = state.store.get_institution(&id_institution).await?;
    Ok(Json(institution))
}

/// `DELETE /v1/institutions/:id_institution`. Returns 204; memberships and
/// PPDAs of the institution go with it.
pub(crate) async fn delete_institution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_institution): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin_caller(&state, &headers).await?;
    state.store.delete_institution(&id_institution).await?;
    tracing::info!(id_institution = %id_institution, "institution deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /v1/institutions/:id_institution/members/:id_user`.
///
/// Both ends of the membership must exist; the upsert then sets role and
/// active flag.
pub(crate) async fn put_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id_institution, id_user)): Path<(String, String)>,
    Json(body): Json<MembershipRequest>,
) -> Result<Json<UserInstitution>, ApiError> {
    require_admin_caller(&state, &headers).await?;
    state.store.get_institution(&id_institution).await?;
    state.store.get_user(&id_user).await?;
    let membership = state
        .store
        .upsert_membership(UserInstitution {
            id_user,
            id_institution,
            role: body.role,
            is_active: body.is_active,
        })
        .await?;
    Ok(Json(membership))
}

/// `DELETE /v1/institutions/:id_institution/members/:id_user`. Returns 204.
pub(crate) async fn delete_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id_institution, id_user)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_admin_caller(&state, &headers).await?;
    state.store.delete_membership(&id_user, &id_institution).await?;
    Ok(StatusCode::NO_CONTENT)
}
