use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::claims::AuthenticatedAccount, state::AppState};

/// Pulls the token out of `Bearer <token>`.
///
/// The header must be exactly two parts separated by a single space, the
/// scheme must be `Bearer` and the token non-empty. Anything else is refused
/// before any signature work is done.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;

    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }

    Some(token)
}

/// A middleware that requires a valid bearer token.
///
/// On success the verified identity is inserted into the request extensions
/// as an `AuthenticatedAccount` for handlers to pick up.
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
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking bearer token...");

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("bearer gate: missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("bearer gate: non-ASCII Authorization header"))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| AppError::unauthorized("bearer gate: malformed Bearer header"))?;
    tracing::debug!("Bearer header parsed");

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::warn!("❌ Bearer token rejected: {}", e);
        AppError::from(e)
    })?;
    tracing::debug!("Token verified for subject {}", claims.sub);

    let identity = AuthenticatedAccount::from_claims(&claims)
        .ok_or_else(|| AppError::unauthorized("bearer gate: subject is not an account id"))?;
    tracing::debug!("✅ Bound account {} to request", identity.account_id);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
