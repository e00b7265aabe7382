use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::cache::SessionCache;
use crate::crypto::aes::{EncryptedBlob, SecureKey};
use crate::models::session::Session;

const SESSION_KEY_PREFIX: &str = "account:session:";

/// The cache key holding `account_id`'s session.
pub fn session_key(account_id: i64) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, account_id)
}

/// Session store failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session write failed: {0}")]
    Write(String),

    #[error("session read failed: {0}")]
    Read(String),

    #[error("session not found")]
    NotFound,

    /// The stored blob does not decrypt: tampered, truncated or sealed under
    /// another key.
    #[error("session corrupted: {0}")]
    Corrupted(String),

    #[error("session encoding failed: {0}")]
    Encode(String),

    #[error("session cache timed out")]
    Timeout,
}

/// Encrypted, TTL-bound session records, one per account.
///
/// A put overwrites whatever the account had before; concurrent puts race and
/// the last write wins.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn SessionCache>,
    key: Arc<SecureKey>,
    op_timeout: Duration,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn SessionCache>, key: SecureKey, op_timeout: Duration) -> Self {
        Self {
            cache,
            key: Arc::new(key),
            op_timeout,
        }
    }

    /// Seals `payload` under a fresh nonce and writes it with `ttl`.
    pub async fn put(&self, account_id: i64, payload: &[u8], ttl: Duration) -> Result<(), SessionError> {
        if ttl.as_secs() == 0 {
            return Err(SessionError::Write(
                "ttl must be at least one second".to_string(),
            ));
        }

        let blob = EncryptedBlob::seal(&self.key, payload)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        let key = session_key(account_id);

        self.bounded(self.cache.set_ex(&key, blob.encode(), ttl))
            .await?
            .map_err(|e| SessionError::Write(e.to_string()))?;

        tracing::debug!("Session stored under {}", key);
        Ok(())
    }

    /// Reads and decrypts the account's payload.
    pub async fn get(&self, account_id: i64) -> Result<Vec<u8>, SessionError> {
        let key = session_key(account_id);
        let stored = self
            .bounded(self.cache.get(&key))
            .await?
            .map_err(|e| SessionError::Read(e.to_string()))?
            .ok_or(SessionError::NotFound)?;

        EncryptedBlob::decode(&stored)
            .and_then(|blob| blob.open(&self.key))
            .map_err(|e| {
                tracing::warn!("Session under {} failed to decrypt: {}", key, e);
                SessionError::Corrupted(e.to_string())
            })
    }

    /// Removes the account's session. A missing record is not an error.
    pub async fn delete(&self, account_id: i64) -> Result<(), SessionError> {
        let key = session_key(account_id);
        self.bounded(self.cache.del(&key))
            .await?
            .map_err(|e| SessionError::Write(e.to_string()))?;

        tracing::debug!("Session under {} invalidated", key);
        Ok(())
    }

    pub async fn put_session(&self, session: &Session, ttl: Duration) -> Result<(), SessionError> {
        let payload = sonic_rs::to_vec(session).map_err(|e| SessionError::Encode(e.to_string()))?;
        self.put(session.account_id, &payload, ttl).await
    }

    pub async fn get_session(&self, account_id: i64) -> Result<Session, SessionError> {
        let payload = self.get(account_id).await?;
        let session: Session = sonic_rs::from_slice(&payload)
            .map_err(|e| SessionError::Corrupted(format!("undecodable session payload: {}", e)))?;

        if session.account_id != account_id {
            return Err(SessionError::Corrupted(format!(
                "record under account {} belongs to account {}",
                account_id, session.account_id
            )));
        }

        Ok(session)
    }

    async fn bounded<T>(&self, operation: impl Future<Output = T>) -> Result<T, SessionError> {
        tokio::time::timeout(self.op_timeout, operation)
            .await
            .map_err(|_| SessionError::Timeout)
    }
}
