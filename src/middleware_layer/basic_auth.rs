use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{config::BasicCredentials, error::AppError, state::AppState};

/// Holds SHA-256 digests of the configured credential pair.
///
/// Comparing fixed-size digests in constant time keeps both the contents and
/// the length of the secrets out of response timing.
pub struct BasicAuthVerifier {
    username_digest: [u8; 32],
    password_digest: [u8; 32],
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

impl BasicAuthVerifier {
    pub fn new(credentials: &BasicCredentials) -> Self {
        Self {
            username_digest: digest(&credentials.username),
            password_digest: digest(&credentials.password),
        }
    }

    /// True only when both halves match. Both are always compared.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let username_ok = digest(username)[..].ct_eq(&self.username_digest[..]);
        let password_ok = digest(password)[..].ct_eq(&self.password_digest[..]);
        (username_ok & password_ok).into()
    }
}

/// Decodes `Basic <base64(username:password)>`.
///
/// The password may itself contain `:`; only the first one splits.
pub fn parse_basic_credentials(header: &str) -> Option<(String, Zeroizing<String>)> {
    let (scheme, encoded) = header.split_once(' ')?;
    if scheme != "Basic" || encoded.is_empty() || encoded.contains(' ') {
        return None;
    }

    let decoded = Zeroizing::new(STANDARD.decode(encoded).ok()?);
    let decoded = std::str::from_utf8(&decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), Zeroizing::new(password.to_string())))
}

/// A middleware that admits only requests carrying the configured basic
/// credentials.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The downstream `Response`, or `AppError::Unauthorized`.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("basic gate: missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("basic gate: non-ASCII Authorization header"))?;

    let (username, password) = parse_basic_credentials(header)
        .ok_or_else(|| AppError::unauthorized("basic gate: malformed Basic credentials"))?;

    if !state.basic_auth.verify(&username, &password) {
        return Err(AppError::unauthorized("basic gate: credential mismatch"));
    }

    tracing::debug!("✅ Basic credentials accepted");
    Ok(next.run(request).await)
}
