//! Postgres-backed implementation of the backend store.
//!
//! # What this module is
//! Implements `BackendStore` using Postgres (via `sqlx`) as the durable store
//! for identity and authorization state (users, refresh tokens, institutions,
//! memberships) plus the prevention-plan rows the RBAC gate protects.
//!
//! # Key invariants
//! - Refresh-token redemption is serialized per token at the data layer: the
//!   mark-used write is a conditional `UPDATE ... WHERE used = FALSE AND
//!   revoked = FALSE` checked by affected-row count, never a separate
//!   read-then-write. Two concurrent redemptions cannot both succeed.
//! - Refresh token rows are never deleted by the service; `used`/`revoked`
//!   are latch flags retained for audit and replay detection.
//! - Uniqueness (username, email, one membership per user/institution pair)
//!   is enforced by the schema and surfaced as `StoreError::Conflict`.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")` so
//!   handlers can assume the schema exists; a migration failure fails startup
//!   instead of serving partially functional endpoints.
//! - Pool limits and the acquire timeout are explicit because hanging forever
//!   on database failures is unacceptable for an auth service.
//! - Database URLs may contain credentials; they are never logged.
use super::{BackendStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{
    Institution, Ppda, PpdaPatch, RefreshToken, Role, User, UserInstitution, UserPatch,
    now_epoch_seconds,
};
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `users` table.
///
/// DB-facing structs are kept separate from domain types so column names and
/// storage formats stay localized to this module.
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id_user: String,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
struct DbRefreshToken {
    id_token: String,
    id_user: String,
    token_hash: String,
    expires_at: i64,
    used: bool,
    revoked: bool,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
struct DbInstitution {
    id_institution: String,
    institution_name: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
struct DbMembership {
    id_user: String,
    id_institution: String,
    role: String,
    is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
struct DbPpda {
    id_ppda: String,
    id_institution: String,
    created_at: i64,
    updated_at: i64,
}

impl PostgresStore {
    /// Connect to Postgres and run embedded migrations.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl BackendStore for PostgresStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let insert = sqlx::query(
            r#"INSERT INTO users (id_user, username, email, password_hash, is_admin, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&user.id_user)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("username or email taken".into()));
            }
            return Err(err.into());
        }
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, DbUser>(
            "SELECT id_user, username, email, password_hash, is_admin, created_at, updated_at \
             FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(user_from_db).collect())
    }

    async fn get_user(&self, id_user: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id_user, username, email, password_hash, is_admin, created_at, updated_at \
             FROM users WHERE id_user = $1",
        )
        .bind(id_user)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_db)
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id_user, username, email, password_hash, is_admin, created_at, updated_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_db))
    }

    async fn update_user(&self, id_user: &str, patch: UserPatch) -> StoreResult<User> {
        // COALESCE keeps the merge a single atomic statement: absent patch
        // fields fall back to the stored value.
        let update = sqlx::query_as::<_, DbUser>(
            r#"UPDATE users
               SET username = COALESCE($2, username),
                   email = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   is_admin = COALESCE($5, is_admin),
                   updated_at = $6
               WHERE id_user = $1
               RETURNING id_user, username, email, password_hash, is_admin, created_at, updated_at"#,
        )
        .bind(id_user)
        .bind(patch.username)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.is_admin)
        .bind(now_epoch_seconds())
        .fetch_optional(&self.pool)
        .await;
        match update {
            Ok(Some(row)) => Ok(user_from_db(row)),
            Ok(None) => Err(StoreError::NotFound("user".into())),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("username or email taken".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_user(&self, id_user: &str) -> StoreResult<()> {
        // Dependent refresh tokens and memberships cascade via the schema.
        let result = sqlx::query("DELETE FROM users WHERE id_user = $1")
            .bind(id_user)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user".into()));
        }
        Ok(())
    }

    async fn insert_refresh_token(&self, token: RefreshToken) -> StoreResult<()> {
        let insert = sqlx::query(
            r#"INSERT INTO refresh_tokens (id_token, id_user, token_hash, expires_at, used, revoked, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(&token.id_token)
        .bind(&token.id_user)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.revoked)
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("refresh token exists".into()));
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn get_refresh_token(&self, id_token: &str) -> StoreResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, DbRefreshToken>(
            "SELECT id_token, id_user, token_hash, expires_at, used, revoked, created_at, updated_at \
             FROM refresh_tokens WHERE id_token = $1",
        )
        .bind(id_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| RefreshToken {
            id_token: row.id_token,
            id_user: row.id_user,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            used: row.used,
            revoked: row.revoked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn consume_refresh_token(&self, id_token: &str, now: i64) -> StoreResult<bool> {
        // The conditional predicate is the single-use guarantee: a second
        // redemption (or a redemption racing this one) matches zero rows.
        let result = sqlx::query(
            r#"UPDATE refresh_tokens
               SET used = TRUE, updated_at = $2
               WHERE id_token = $1 AND used = FALSE AND revoked = FALSE AND expires_at > $2"#,
        )
        .bind(id_token)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_institution(&self, institution: Institution) -> StoreResult<Institution> {
        let insert = sqlx::query(
            r#"INSERT INTO institutions (id_institution, institution_name, created_at, updated_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&institution.id_institution)
        .bind(&institution.institution_name)
        .bind(institution.created_at)
        .bind(institution.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("institution exists".into()));
            }
            return Err(err.into());
        }
        Ok(institution)
    }

    async fn list_institutions(&self) -> StoreResult<Vec<Institution>> {
        let rows = sqlx::query_as::<_, DbInstitution>(
            "SELECT id_institution, institution_name, created_at, updated_at \
             FROM institutions ORDER BY institution_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(institution_from_db).collect())
    }

    async fn get_institution(&self, id_institution: &str) -> StoreResult<Institution> {
        let row = sqlx::query_as::<_, DbInstitution>(
            "SELECT id_institution, institution_name, created_at, updated_at \
             FROM institutions WHERE id_institution = $1",
        )
        .bind(id_institution)
        .fetch_optional(&self.pool)
        .await?;
        row.map(institution_from_db)
            .ok_or_else(|| StoreError::NotFound("institution".into()))
    }

    async fn delete_institution(&self, id_institution: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM institutions WHERE id_institution = $1")
            .bind(id_institution)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("institution".into()));
        }
        Ok(())
    }

    async fn upsert_membership(&self, membership: UserInstitution) -> StoreResult<UserInstitution> {
        // One row per (user, institution) pair; a re-grant updates role and
        // active flag in place.
        sqlx::query(
            r#"INSERT INTO user_institutions (id_user, id_institution, role, is_active)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (id_user, id_institution)
               DO UPDATE SET role = EXCLUDED.role, is_active = EXCLUDED.is_active"#,
        )
        .bind(&membership.id_user)
        .bind(&membership.id_institution)
        .bind(membership.role.as_str())
        .bind(membership.is_active)
        .execute(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn delete_membership(&self, id_user: &str, id_institution: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM user_institutions WHERE id_user = $1 AND id_institution = $2",
        )
        .bind(id_user)
        .bind(id_institution)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("membership".into()));
        }
        Ok(())
    }

    async fn active_memberships(
        &self,
        id_user: &str,
        institution_ids: &[String],
    ) -> StoreResult<Vec<UserInstitution>> {
        let rows = sqlx::query_as::<_, DbMembership>(
            r#"SELECT id_user, id_institution, role, is_active
               FROM user_institutions
               WHERE id_user = $1 AND id_institution = ANY($2) AND is_active = TRUE"#,
        )
        .bind(id_user)
        .bind(institution_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(membership_from_db).collect()
    }

    async fn create_ppda(&self, ppda: Ppda) -> StoreResult<Ppda> {
        let insert = sqlx::query(
            r#"INSERT INTO ppdas (id_ppda, id_institution, created_at, updated_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&ppda.id_ppda)
        .bind(&ppda.id_institution)
        .bind(ppda.created_at)
        .bind(ppda.updated_at)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("ppda exists".into()));
            }
            return Err(err.into());
        }
        Ok(ppda)
    }

    async fn list_ppdas(&self, id_institution: &str) -> StoreResult<Vec<Ppda>> {
        let rows = sqlx::query_as::<_, DbPpda>(
            "SELECT id_ppda, id_institution, created_at, updated_at \
             FROM ppdas WHERE id_institution = $1 ORDER BY id_ppda",
        )
        .bind(id_institution)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ppda_from_db).collect())
    }

    async fn get_ppda(&self, id_ppda: &str) -> StoreResult<Ppda> {
        let row = sqlx::query_as::<_, DbPpda>(
            "SELECT id_ppda, id_institution, created_at, updated_at \
             FROM ppdas WHERE id_ppda = $1",
        )
        .bind(id_ppda)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ppda_from_db)
            .ok_or_else(|| StoreError::NotFound("ppda".into()))
    }

    async fn update_ppda(&self, id_ppda: &str, patch: PpdaPatch) -> StoreResult<Ppda> {
        let row = sqlx::query_as::<_, DbPpda>(
            r#"UPDATE ppdas
               SET id_institution = COALESCE($2, id_institution),
                   updated_at = $3
               WHERE id_ppda = $1
               RETURNING id_ppda, id_institution, created_at, updated_at"#,
        )
        .bind(id_ppda)
        .bind(patch.id_institution)
        .bind(now_epoch_seconds())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ppda_from_db)
            .ok_or_else(|| StoreError::NotFound("ppda".into()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn user_from_db(row: DbUser) -> User {
    User {
        id_user: row.id_user,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        is_admin: row.is_admin,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn institution_from_db(row: DbInstitution) -> Institution {
    Institution {
        id_institution: row.id_institution,
        institution_name: row.institution_name,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn membership_from_db(row: DbMembership) -> StoreResult<UserInstitution> {
    let role = Role::parse(&row.role)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid role in storage: {}", row.role)))?;
    Ok(UserInstitution {
        id_user: row.id_user,
        id_institution: row.id_institution,
        role,
        is_active: row.is_active,
    })
}

fn ppda_from_db(row: DbPpda) -> Ppda {
    Ppda {
        id_ppda: row.id_ppda,
        id_institution: row.id_institution,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
