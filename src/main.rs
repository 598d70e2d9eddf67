//! PPDA backend HTTP service entry point.
//!
//! Wires configuration, storage, and the auth core, then starts the API
//! server. The `build_state` helper keeps wiring testable.
use anyhow::Context;
use ppda_api::app::{build_router, AppState};
use ppda_api::auth::service::AuthService;
use ppda_api::auth::token::TokenCodec;
use ppda_api::config::{AppConfig, StorageBackend};
use ppda_api::observability;
use ppda_api::store::memory::InMemoryStore;
use ppda_api::store::postgres::PostgresStore;
use ppda_api::store::BackendStore;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    observability::init_observability();
    let state = build_state(&config).await?;
    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, backend = ?config.storage, "ppda api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }
    Ok(())
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn BackendStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };
    let auth = Arc::new(AuthService::new(TokenCodec::new(&config.auth), store.clone()));
    Ok(AppState { auth, store })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;
    use ppda_api::config::AuthConfig;
    use serial_test::serial;

    fn test_config(storage: StorageBackend) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            storage,
            postgres: None,
            auth: AuthConfig {
                secret_key: "test-secret".to_string(),
                algorithm: Algorithm::HS256,
                access_token_expire_minutes: 30,
                refresh_token_expire_days: 7,
            },
        }
    }

    #[tokio::test]
    async fn build_state_memory_backend() {
        let state = build_state(&test_config(StorageBackend::Memory))
            .await
            .expect("state");
        assert_eq!(state.store.backend_name(), "memory");
        assert!(!state.store.is_durable());
    }

    #[tokio::test]
    async fn build_state_postgres_requires_config() {
        let err = build_state(&test_config(StorageBackend::Postgres))
            .await
            .err()
            .expect("missing postgres");
        assert!(err.to_string().contains("postgres configuration missing"));
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        run_with_shutdown(test_config(StorageBackend::Memory), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }
}
