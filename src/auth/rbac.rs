//! Institution-scoped role checks.
use super::AuthError;
use crate::model::{Role, User};
use crate::store::BackendStore;

/// Require `required` (or higher) in every listed institution.
///
/// The check is all-or-nothing: one active membership per distinct
/// institution, each at sufficient rank, or the whole request is forbidden.
/// Admins bypass membership entirely. An empty institution list is a caller
/// bug, rejected before any lookup.
pub async fn verify_institution_role(
    store: &dyn BackendStore,
    user: &User,
    institution_ids: &[String],
    required: Role,
) -> Result<(), AuthError> {
    let mut wanted: Vec<String> = institution_ids.to_vec();
    wanted.sort();
    wanted.dedup();
    if wanted.is_empty() {
        return Err(AuthError::BadRequest(
            "No institutions provided for access check".into(),
        ));
    }
    if user.is_admin {
        return Ok(());
    }
    let memberships = store.active_memberships(&user.id_user, &wanted).await?;
    if memberships.len() != wanted.len() {
        return Err(AuthError::Forbidden(
            "User doesn't have access to resources of this institution.".into(),
        ));
    }
    if memberships.iter().any(|m| m.role < required) {
        return Err(AuthError::Forbidden(
            "Insufficient role for this action in this institution.".into(),
        ));
    }
    Ok(())
}
