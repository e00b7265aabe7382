use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::crypto::aes::{CipherError, SecureKey};
use crate::crypto::keys::KeyMaterial;
use crate::middleware_layer::basic_auth::BasicAuthVerifier;
use crate::repositories::{account::AccountRepository, article::ArticleRepository};
use crate::services::token::TokenService;
use crate::session::{cache::SessionCache, store::SessionStore};

/// The application's state.
///
/// Everything in here is either immutable or internally synchronized, so the
/// state is cloned into every request without locking.
#[derive(Clone)]
pub struct AppState {
    /// Account storage.
    pub accounts: Arc<dyn AccountRepository>,
    /// Article storage.
    pub articles: Arc<dyn ArticleRepository>,
    /// Encrypted session records.
    pub sessions: SessionStore,
    /// Bearer token issuance and verification.
    pub tokens: TokenService,
    /// The basic-gate credential check.
    pub basic_auth: Arc<BasicAuthVerifier>,
    /// Lifetime of a session record.
    pub session_ttl: Duration,
    /// Deadline applied to every request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the auth core around already-connected storage.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    /// * `keys` - The loaded RSA keypair.
    /// * `accounts` / `articles` - Repository implementations.
    /// * `cache` - The cache backing the session store.
    pub fn new(
        config: &Config,
        keys: Arc<KeyMaterial>,
        accounts: Arc<dyn AccountRepository>,
        articles: Arc<dyn ArticleRepository>,
        cache: Arc<dyn SessionCache>,
    ) -> Result<Self, CipherError> {
        let session_key = SecureKey::from_slice(&config.session_secret)?;
        let sessions = SessionStore::new(cache, session_key, config.cache_timeout);
        tracing::info!("✅ Session store initialized");

        let tokens = TokenService::new(keys, config.token_ttl);
        tracing::info!("✅ Token service initialized (RS256)");

        Ok(AppState {
            accounts,
            articles,
            sessions,
            tokens,
            basic_auth: Arc::new(BasicAuthVerifier::new(&config.basic_auth)),
            session_ttl: config.session_ttl,
            request_timeout: config.request_timeout,
        })
    }
}
