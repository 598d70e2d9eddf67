#![allow(dead_code)]
use jsonwebtoken::Algorithm;
use ppda_api::app::{build_router, AppState};
use ppda_api::auth::password;
use ppda_api::auth::service::AuthService;
use ppda_api::auth::token::TokenCodec;
use ppda_api::config::AuthConfig;
use ppda_api::model::{now_epoch_seconds, Institution, Role, User, UserInstitution};
use ppda_api::store::memory::InMemoryStore;
use ppda_api::store::BackendStore;
use std::sync::Arc;
use uuid::Uuid;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret_key: "integration-test-secret".to_string(),
        algorithm: Algorithm::HS256,
        access_token_expire_minutes: 30,
        refresh_token_expire_days: 7,
    }
}

/// In-memory app plus a handle on the store for seeding and assertions.
pub fn test_app() -> (axum::Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let backend: Arc<dyn BackendStore> = store.clone();
    let auth = Arc::new(AuthService::new(
        TokenCodec::new(&test_auth_config()),
        backend.clone(),
    ));
    let app = build_router(AppState {
        auth,
        store: backend,
    });
    (app, store)
}

pub async fn seed_user(
    store: &InMemoryStore,
    username: &str,
    plain_password: &str,
    is_admin: bool,
) -> User {
    let now = now_epoch_seconds();
    store
        .create_user(User {
            id_user: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: format!("{username}@example.org"),
            password_hash: password::hash_secret(plain_password).expect("hash"),
            is_admin,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed user")
}

pub async fn seed_institution(store: &InMemoryStore, id_institution: &str, name: &str) {
    let now = now_epoch_seconds();
    store
        .create_institution(Institution {
            id_institution: id_institution.to_string(),
            institution_name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed institution");
}

pub async fn seed_membership(
    store: &InMemoryStore,
    user: &User,
    id_institution: &str,
    role: Role,
) {
    store
        .upsert_membership(UserInstitution {
            id_user: user.id_user.clone(),
            id_institution: id_institution.to_string(),
            role,
            is_active: true,
        })
        .await
        .expect("seed membership");
}
