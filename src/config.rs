use anyhow::{bail, Context, Result};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

// Service configuration sourced from environment variables, with an optional
// YAML override file for deployments that prefer mounted config.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: u64,
    pub refresh_token_expire_days: u64,
}

#[derive(Debug, Deserialize)]
struct AppConfigOverride {
    bind_addr: Option<String>,
    storage: Option<String>,
    database_url: Option<String>,
    secret_key: Option<String>,
    algorithm: Option<String>,
    access_token_expire_minutes: Option<u64>,
    refresh_token_expire_days: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("PPDA_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .with_context(|| "parse PPDA_BIND")?;
        let storage = parse_storage(
            &std::env::var("PPDA_STORAGE").unwrap_or_else(|_| "memory".to_string()),
        )?;
        let postgres = match std::env::var("DATABASE_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_number("PPDA_PG_MAX_CONNECTIONS", 5)?,
                acquire_timeout_ms: env_number("PPDA_PG_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        let secret_key = std::env::var("SECRET_KEY").with_context(|| "SECRET_KEY is required")?;
        let algorithm = parse_algorithm(
            &std::env::var("ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
        )?;
        let config = Self {
            bind_addr,
            storage,
            postgres,
            auth: AuthConfig {
                secret_key,
                algorithm,
                access_token_expire_minutes: env_number("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
                refresh_token_expire_days: env_number("REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            },
        };
        check_token_ttls(&config.auth)?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("PPDA_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read PPDA_CONFIG: {path}"))?;
            let override_cfg: AppConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.storage {
                config.storage = parse_storage(&value)?;
            }
            if let Some(url) = override_cfg.database_url {
                config.postgres = Some(match config.postgres.take() {
                    Some(pg) => PostgresConfig { url, ..pg },
                    None => PostgresConfig {
                        url,
                        max_connections: 5,
                        acquire_timeout_ms: 5_000,
                    },
                });
            }
            if let Some(value) = override_cfg.secret_key {
                config.auth.secret_key = value;
            }
            if let Some(value) = override_cfg.algorithm {
                config.auth.algorithm = parse_algorithm(&value)?;
            }
            if let Some(value) = override_cfg.access_token_expire_minutes {
                config.auth.access_token_expire_minutes = value;
            }
            if let Some(value) = override_cfg.refresh_token_expire_days {
                config.auth.refresh_token_expire_days = value;
            }
            check_token_ttls(&config.auth)?;
        }
        Ok(config)
    }
}

// Ceiling on configured token lifetimes. Anything near this is a typo, and
// bounding here keeps the expiry arithmetic in the token codec away from
// i64 overflow (which would mint tokens with a negative exp).
const MAX_TOKEN_TTL_SECONDS: u64 = 100 * 365 * 86_400;

fn check_token_ttls(auth: &AuthConfig) -> Result<()> {
    let access_seconds = auth.access_token_expire_minutes.checked_mul(60);
    let refresh_seconds = auth.refresh_token_expire_days.checked_mul(86_400);
    match (access_seconds, refresh_seconds) {
        (Some(access), Some(refresh))
            if access <= MAX_TOKEN_TTL_SECONDS && refresh <= MAX_TOKEN_TTL_SECONDS =>
        {
            Ok(())
        }
        _ => bail!(
            "token lifetime too large: ACCESS_TOKEN_EXPIRE_MINUTES and \
             REFRESH_TOKEN_EXPIRE_DAYS must stay within {MAX_TOKEN_TTL_SECONDS} seconds"
        ),
    }
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "postgres" => Ok(StorageBackend::Postgres),
        other => bail!("unknown storage backend: {other}"),
    }
}

// Symmetric HMAC variants only; asymmetric algorithms would need key files
// this service does not manage.
fn parse_algorithm(value: &str) -> Result<Algorithm> {
    match value {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => bail!("unsupported JWT algorithm: {other}"),
    }
}

fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
