use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// Upper bound for token and session lifetimes: one year.
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// The single username/password pair admitted by the basic-credential gate.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: Zeroizing<String>,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &"**redacted**")
            .field("password", &"**redacted**")
            .finish()
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// Upper bound on pooled database connections.
    pub database_max_connections: usize,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// PEM file holding the RSA private key.
    pub private_key_path: PathBuf,
    /// PEM file holding the RSA public key.
    pub public_key_path: PathBuf,
    /// Lifetime of an issued bearer token.
    pub token_ttl: Duration,
    /// The 32-byte AES-256 key sealing session records.
    pub session_secret: Zeroizing<Vec<u8>>,
    /// Lifetime of a session record in the cache.
    pub session_ttl: Duration,
    /// Bound on a single cache round trip.
    pub cache_timeout: Duration,
    /// Deadline for a whole request.
    pub request_timeout: Duration,
    /// The basic-gate credential pair.
    pub basic_auth: BasicCredentials,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut session_secret_hex = env::var("SESSION_SECRET_KEY")
            .context("SESSION_SECRET_KEY must be set (generate with: openssl rand -hex 32)")?;

        let session_secret = hex::decode(&session_secret_hex)
            .context("SESSION_SECRET_KEY must be valid hexadecimal")?;

        session_secret_hex.zeroize();

        if session_secret.len() != 32 {
            anyhow::bail!("SESSION_SECRET_KEY must be exactly 32 bytes (64 hex characters)");
        }

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = parse_or("APP_PORT", 8080)?;
        let listen_addr = format!("{}:{}", host, port)
            .parse()
            .context("APP_HOST/APP_PORT do not form a socket address")?;

        Ok(Self {
            listen_addr,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 16)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            private_key_path: env::var("JWT_PRIVATE_KEY_PATH")
                .unwrap_or_else(|_| "./secret/id_rsa".to_string())
                .into(),
            public_key_path: env::var("JWT_PUBLIC_KEY_PATH")
                .unwrap_or_else(|_| "./secret/id_rsa.pub".to_string())
                .into(),
            token_ttl: Duration::from_secs(ttl_or("TOKEN_TTL_SECS", 86_400)?),
            session_secret: Zeroizing::new(session_secret),
            session_ttl: Duration::from_secs(ttl_or("SESSION_TTL_SECS", 86_400)?),
            cache_timeout: Duration::from_millis(positive_or("CACHE_TIMEOUT_MS", 2_000)?),
            request_timeout: Duration::from_secs(positive_or("REQUEST_TIMEOUT_SECS", 15)?),
            basic_auth: BasicCredentials {
                username: Zeroizing::new(
                    env::var("BASIC_AUTH_USERNAME").context("BASIC_AUTH_USERNAME must be set")?,
                ),
                password: Zeroizing::new(
                    env::var("BASIC_AUTH_PASSWORD").context("BASIC_AUTH_PASSWORD must be set")?,
                ),
            },
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn positive_or(name: &str, default: u64) -> Result<u64> {
    let value = parse_or(name, default)?;
    if value == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

fn ttl_or(name: &str, default: u64) -> Result<u64> {
    check_ttl(name, positive_or(name, default)?)
}

fn check_ttl(name: &str, secs: u64) -> Result<u64> {
    if secs > MAX_TTL_SECS {
        anyhow::bail!("{} must be at most {} seconds", name, MAX_TTL_SECS);
    }
    Ok(secs)
}
