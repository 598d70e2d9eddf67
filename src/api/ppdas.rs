//! PPDA endpoints, gated by institution role.
//!
//! Reads require VIEWER in the queried institution; writes require EDITOR.
//! Moving a PPDA between institutions requires EDITOR in both the current
//! and the target institution at once.
use crate::api::error::{api_validation_error, ApiError};
use crate::api::types::{CreatePpdaRequest, PpdaListQuery, UpdatePpdaRequest};
use crate::app::AppState;
use crate::auth::{gate, rbac};
use crate::model::{now_epoch_seconds, Ppda, PpdaPatch, Role};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

/// `GET /v1/ppdas?institution_id=...`.
pub(crate) async fn list_ppdas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PpdaListQuery>,
) -> Result<Json<Vec<Ppda>>, ApiError> {
    let caller = gate::current_user(&state.auth, &headers).await?;
    rbac::verify_institution_role(
        state.store.as_ref(),
        &caller,
        &[query.institution_id.clone()],
        Role::Viewer,
    )
    .await?;
    let ppdas = state.store.list_ppdas(&query.institution_id).await?;
    Ok(Json(ppdas))
}

/// `POST /v1/ppdas`. Returns 201 with the created record.
pub(crate) async fn create_ppda(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreatePpdaRequest>,
) -> Result<(StatusCode, Json<Ppda>), ApiError> {
    let caller = gate::current_user(&state.auth, &headers).await?;
    if body.id_institution.trim().is_empty() {
        return Err(api_validation_error("id_institution must be non-empty"));
    }
    rbac::verify_institution_role(
        state.store.as_ref(),
        &caller,
        &[body.id_institution.clone()],
        Role::Editor,
    )
    .await?;
    state.store.get_institution(&body.id_institution).await?;
    let now = now_epoch_seconds();
    let created = state
        .store
        .create_ppda(Ppda {
            id_ppda: Uuid::new_v4().to_string(),
            id_institution: body.id_institution,
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(id_ppda = %created.id_ppda, "ppda created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /v1/ppdas/:id_ppda`.
///
/// The role check covers the institution the record is in now and, when the
/// patch moves it, the target institution as well. The existence lookup runs
/// first, so an editor of neither institution still learns whether the id
/// exists; record ids are not treated as secrets.
pub(crate) async fn update_ppda(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id_ppda): Path<String>,
    Json(body): Json<UpdatePpdaRequest>,
) -> Result<Json<Ppda>, ApiError> {
    let caller = gate::current_user(&state.auth, &headers).await?;
    let current = state.store.get_ppda(&id_ppda).await?;
    let mut scope = vec![current.id_institution.clone()];
    if let Some(target) = &body.id_institution {
        if target.trim().is_empty() {
            return Err(api_validation_error("id_institution must be non-empty"));
        }
        scope.push(target.clone());
    }
    rbac::verify_institution_role(state.store.as_ref(), &caller, &scope, Role::Editor).await?;
    if let Some(target) = &body.id_institution {
        state.store.get_institution(target).await?;
    }
    let updated = state
        .store
        .update_ppda(
            &id_ppda,
            PpdaPatch {
                id_institution: body.id_institution,
            },
        )
        .await?;
    Ok(Json(updated))
}
