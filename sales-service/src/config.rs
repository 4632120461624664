use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use common_auth::{JwtConfig, MIN_SECRET_LEN};

const DEFAULT_ISSUER: &str = "sales-service";
const DEFAULT_AUDIENCE: &str = "sales-dashboard";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt: JwtConfig,
    pub password_pepper: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub run_migrations: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Build from an arbitrary variable source; `load_service_config` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .and_then(|value| normalize_optional(&value))
            .context("DATABASE_URL must be set")?;

        let jwt_secret = lookup("JWT_SECRET")
            .and_then(|value| normalize_optional(&value))
            .context("JWT_SECRET must be set")?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"));
        }

        let issuer = lookup("JWT_ISSUER")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let audience = lookup("JWT_AUDIENCE")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());
        let leeway = parse_or(&lookup, "JWT_LEEWAY_SECONDS", 0u32)?;
        let jwt = JwtConfig::new(issuer, audience).with_leeway(leeway);

        let password_pepper = lookup("PASSWORD_PEPPER").and_then(|value| normalize_optional(&value));

        let host = parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&lookup, "PORT", 5000u16)?;
        let db_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let acquire_secs = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECONDS", 5u64)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|value| parse_list(&value))
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|value| bool_from_str(&value))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            jwt_secret,
            jwt,
            password_pepper,
            host,
            port,
            db_max_connections: db_max_connections.max(1),
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            cors_allowed_origins,
            run_migrations,
        })
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("jwt", &self.jwt)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout", &self.db_acquire_timeout)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("run_migrations", &self.run_migrations)
            .finish_non_exhaustive()
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    ServiceConfig::from_lookup(|key| env::var(key).ok())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key).and_then(|value| normalize_optional(&value)) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow!("Failed to parse {key}='{raw}': {err}")),
        None => Ok(default),
    }
}

fn bool_from_str(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|item| normalize_optional(item))
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
