//! In-memory implementation of the backend store.
//!
//! # Purpose
//! Implements `BackendStore` entirely in memory using `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for local development and tests (no
//! external dependencies) and as a fallback when Postgres is not configured.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks serialize mutations; in
//!   particular `consume_refresh_token` performs its check-and-mark under a
//!   single write lock so two concurrent redemptions of the same token
//!   cannot both succeed.
use super::{BackendStore, StoreError, StoreResult};
use crate::model::{
    Institution, Ppda, PpdaPatch, RefreshToken, User, UserInstitution, UserPatch,
    now_epoch_seconds,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
    institutions: RwLock<HashMap<String, Institution>>,
    memberships: RwLock<HashMap<(String, String), UserInstitution>>,
    ppdas: RwLock<HashMap<String, Ppda>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of refresh-token rows, used or not.
    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }
}

#[async_trait]
impl BackendStore for InMemoryStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id_user) {
            return Err(StoreError::Conflict("user exists".into()));
        }
        if users
            .values()
            .any(|existing| existing.username == user.username || existing.email == user.email)
        {
            return Err(StoreError::Conflict("username or email taken".into()));
        }
        users.insert(user.id_user.clone(), user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut items: Vec<User> = users.values().cloned().collect();
        items.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(items)
    }

    async fn get_user(&self, id_user: &str) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(id_user)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn update_user(&self, id_user: &str, patch: UserPatch) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if let Some(candidate) = &patch.username {
            if users
                .values()
                .any(|other| other.id_user != id_user && &other.username == candidate)
            {
                return Err(StoreError::Conflict("username taken".into()));
            }
        }
        if let Some(candidate) = &patch.email {
            if users
                .values()
                .any(|other| other.id_user != id_user && &other.email == candidate)
            {
                return Err(StoreError::Conflict("email taken".into()));
            }
        }
        let user = users
            .get_mut(id_user)
            .ok_or_else(|| StoreError::NotFound("user".into()))?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_admin) = patch.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = now_epoch_seconds();
        Ok(user.clone())
    }

    async fn delete_user(&self, id_user: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.remove(id_user).is_none() {
            return Err(StoreError::NotFound("user".into()));
        }
        // Mirror the relational cascade: dependent rows go with the user.
        self.refresh_tokens
            .write()
            .await
            .retain(|_, token| token.id_user != id_user);
        self.memberships
            .write()
            .await
            .retain(|(owner, _), _| owner != id_user);
        Ok(())
    }

    async fn insert_refresh_token(&self, token: RefreshToken) -> StoreResult<()> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(&token.id_token) {
            return Err(StoreError::Conflict("refresh token exists".into()));
        }
        tokens.insert(token.id_token.clone(), token);
        Ok(())
    }

    async fn get_refresh_token(&self, id_token: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(self.refresh_tokens.read().await.get(id_token).cloned())
    }

    async fn consume_refresh_token(&self, id_token: &str, now: i64) -> StoreResult<bool> {
        // Single write lock covers the check and the mark, the in-memory
        // equivalent of the conditional UPDATE in the Postgres backend.
        let mut tokens = self.refresh_tokens.write().await;
        let Some(token) = tokens.get_mut(id_token) else {
            return Ok(false);
        };
        if token.used || token.revoked || token.expires_at <= now {
            return Ok(false);
        }
        token.used = true;
        token.updated_at = now;
        Ok(true)
    }

    async fn create_institution(&self, institution: Institution) -> StoreResult<Institution> {
        let mut institutions = self.institutions.write().await;
        if institutions.contains_key(&institution.id_institution) {
            return Err(StoreError::Conflict("institution exists".into()));
        }
        institutions.insert(institution.id_institution.clone(), institution.clone());
        Ok(institution)
    }

    async fn list_institutions(&self) -> StoreResult<Vec<Institution>> {
        let institutions = self.institutions.read().await;
        let mut items: Vec<Institution> = institutions.values().cloned().collect();
        items.sort_by(|a, b| a.institution_name.cmp(&b.institution_name));
        Ok(items)
    }

    async fn get_institution(&self, id_institution: &str) -> StoreResult<Institution> {
        self.institutions
            .read()
            .await
            .get(id_institution)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("institution".into()))
    }

    async fn delete_institution(&self, id_institution: &str) -> StoreResult<()> {
        let mut institutions = self.institutions.write().await;
        if institutions.remove(id_institution).is_none() {
            return Err(StoreError::NotFound("institution".into()));
        }
        self.memberships
            .write()
            .await
            .retain(|(_, scope), _| scope != id_institution);
        self.ppdas
            .write()
            .await
            .retain(|_, ppda| ppda.id_institution != id_institution);
        Ok(())
    }

    async fn upsert_membership(&self, membership: UserInstitution) -> StoreResult<UserInstitution> {
        let mut memberships = self.memberships.write().await;
        let key = (
            membership.id_user.clone(),
            membership.id_institution.clone(),
        );
        memberships.insert(key, membership.clone());
        Ok(membership)
    }

    async fn delete_membership(&self, id_user: &str, id_institution: &str) -> StoreResult<()> {
        let mut memberships = self.memberships.write().await;
        let key = (id_user.to_string(), id_institution.to_string());
        if memberships.remove(&key).is_none() {
            return Err(StoreError::NotFound("membership".into()));
        }
        Ok(())
    }

    async fn active_memberships(
        &self,
        id_user: &str,
        institution_ids: &[String],
    ) -> StoreResult<Vec<UserInstitution>> {
        let memberships = self.memberships.read().await;
        Ok(institution_ids
            .iter()
            .filter_map(|id_institution| {
                memberships.get(&(id_user.to_string(), id_institution.clone()))
            })
            .filter(|membership| membership.is_active)
            .cloned()
            .collect())
    }

    async fn create_ppda(&self, ppda: Ppda) -> StoreResult<Ppda> {
        let mut ppdas = self.ppdas.write().await;
        if ppdas.contains_key(&ppda.id_ppda) {
            return Err(StoreError::Conflict("ppda exists".into()));
        }
        ppdas.insert(ppda.id_ppda.clone(), ppda.clone());
        Ok(ppda)
    }

    async fn list_ppdas(&self, id_institution: &str) -> StoreResult<Vec<Ppda>> {
        let ppdas = self.ppdas.read().await;
        let mut items: Vec<Ppda> = ppdas
            .values()
            .filter(|ppda| ppda.id_institution == id_institution)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id_ppda.cmp(&b.id_ppda));
        Ok(items)
    }

    async fn get_ppda(&self, id_ppda: &str) -> StoreResult<Ppda> {
        self.ppdas
            .read()
            .await
            .get(id_ppda)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("ppda".into()))
    }

    async fn update_ppda(&self, id_ppda: &str, patch: PpdaPatch) -> StoreResult<Ppda> {
        let mut ppdas = self.ppdas.write().await;
        let ppda = ppdas
            .get_mut(id_ppda)
            .ok_or_else(|| StoreError::NotFound("ppda".into()))?;
        if let Some(id_institution) = patch.id_institution {
            ppda.id_institution = id_institution;
        }
        ppda.updated_at = now_epoch_seconds();
        Ok(ppda.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
