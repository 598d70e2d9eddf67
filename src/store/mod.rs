use crate::model::{Institution, Ppda, PpdaPatch, RefreshToken, User, UserInstitution, UserPatch};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary shared by all request handlers.
///
/// Implemented by the in-memory backend (dev/tests) and the Postgres backend
/// (production). Every mutating operation must be atomic within one backend
/// call; callers never compose multi-step transactions across the trait.
#[async_trait]
pub trait BackendStore: Send + Sync {
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id_user: &str) -> StoreResult<User>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id_user: &str, patch: UserPatch) -> StoreResult<User>;
    async fn delete_user(&self, id_user: &str) -> StoreResult<()>;

    async fn insert_refresh_token(&self, token: RefreshToken) -> StoreResult<()>;
    async fn get_refresh_token(&self, id_token: &str) -> StoreResult<Option<RefreshToken>>;
    /// Atomically mark a refresh token used.
    ///
    /// Returns `true` only if the row existed and was still unused,
    /// unrevoked, and unexpired at the moment of the write. Two concurrent
    /// redemption attempts for the same token must not both observe `true`.
    async fn consume_refresh_token(&self, id_token: &str, now: i64) -> StoreResult<bool>;

    async fn create_institution(&self, institution: Institution) -> StoreResult<Institution>;
    async fn list_institutions(&self) -> StoreResult<Vec<Institution>>;
    async fn get_institution(&self, id_institution: &str) -> StoreResult<Institution>;
    async fn delete_institution(&self, id_institution: &str) -> StoreResult<()>;

    async fn upsert_membership(&self, membership: UserInstitution) -> StoreResult<UserInstitution>;
    async fn delete_membership(&self, id_user: &str, id_institution: &str) -> StoreResult<()>;
    /// Active memberships of one user across the given institutions.
    ///
    /// Rows with `is_active = false` are excluded here so deactivation
    /// removes access without deleting the membership.
    async fn active_memberships(
        &self,
        id_user: &str,
        institution_ids: &[String],
    ) -> StoreResult<Vec<UserInstitution>>;

    async fn create_ppda(&self, ppda: Ppda) -> StoreResult<Ppda>;
    async fn list_ppdas(&self, id_institution: &str) -> StoreResult<Vec<Ppda>>;
    async fn get_ppda(&self, id_ppda: &str) -> StoreResult<Ppda>;
    async fn update_ppda(&self, id_ppda: &str, patch: PpdaPatch) -> StoreResult<Ppda>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
