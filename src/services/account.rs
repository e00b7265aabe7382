use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{
        account::{Account, NewAccount},
        claims::AuthenticatedAccount,
        session::Session,
    },
    services::password,
    state::AppState,
};

/// A successful login: the bearer token and who it was issued to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

/// Lowercases and trims an email so lookups and inserts agree.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `now + ttl`, refusing values chrono cannot represent.
fn session_expiry(now: DateTime<Utc>, ttl: std::time::Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal("session ttl out of range".to_string()))
}

async fn hash_off_runtime(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}

async fn verify_off_runtime(plain: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
}

/// Creates a new account.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `email` - The account's login email.
/// * `plain_password` - The password to hash and store.
/// * `first_name` / `last_name` - Display names.
///
/// # Returns
///
/// The stored `Account`, or `AppError::Conflict` when the email is taken.
pub async fn register(
    state: &AppState,
    email: &str,
    plain_password: String,
    first_name: String,
    last_name: String,
) -> Result<Account> {
    let email = normalize_email(email);
    tracing::debug!("📝 Registering account: {}", email);

    if state.accounts.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_off_runtime(plain_password).await?;

    let account = state
        .accounts
        .save(NewAccount {
            email,
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!("✅ Account registered with ID: {}", account.id);
    Ok(account)
}

/// Checks the password, issues a bearer token and stores the session.
///
/// An unknown email and a wrong password are the same failure to the caller.
/// A second login replaces the account's previous session record.
pub async fn login(state: &AppState, email: &str, plain_password: String) -> Result<LoginOutcome> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Login attempt: {}", email);

    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::unauthorized(format!("unknown email {}", email)))?;

    if !verify_off_runtime(plain_password, account.password_hash.clone()).await? {
        return Err(AppError::unauthorized(format!(
            "wrong password for account {}",
            account.id
        )));
    }

    let issued = state.tokens.issue(account.id, &account.email)?;
    let expires_at = DateTime::from_timestamp(issued.claims.exp, 0)
        .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?;

    let now = Utc::now();
    let session = Session {
        account_id: account.id,
        email: account.email.clone(),
        created_at: now,
        expires_at: session_expiry(now, state.session_ttl)?,
    };

    state.sessions.put_session(&session, state.session_ttl).await?;
    tracing::info!("✅ Account {} logged in", account.id);

    Ok(LoginOutcome {
        token: issued.token,
        token_type: "Bearer",
        expires_at,
        account,
    })
}

/// Returns the caller's account. Requires a live session record.
pub async fn profile(state: &AppState, identity: &AuthenticatedAccount) -> Result<Account> {
    let session = state.sessions.get_session(identity.account_id).await?;
    tracing::debug!(
        "Session for account {} valid until {}",
        session.account_id,
        session.expires_at
    );

    state
        .accounts
        .find_by_id(identity.account_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Drops the caller's session record. The token itself stays valid until it
/// expires, but session-bound operations stop working.
pub async fn logout(state: &AppState, identity: &AuthenticatedAccount) -> Result<()> {
    state.sessions.delete(identity.account_id).await?;
    tracing::info!("👋 Account {} logged out", identity.account_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn session_expiry_adds_ttl_and_refuses_overflow() {
        let now = Utc::now();
        let ttl = std::time::Duration::from_secs(86_400);
        assert_eq!(
            session_expiry(now, ttl).unwrap(),
            now + chrono::Duration::hours(24)
        );

        assert!(matches!(
            session_expiry(now, std::time::Duration::from_secs(u64::MAX)),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            session_expiry(DateTime::<Utc>::MAX_UTC, ttl),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn login_outcome_serializes_camel_case_without_hash() {
        let outcome = LoginOutcome {
            token: "a.b.c".to_string(),
            token_type: "Bearer",
            expires_at: Utc::now(),
            account: Account {
                id: 13,
                email: "a@b.com".to_string(),
                password_hash: "$argon2id$secret".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                created_at: Utc::now(),
                last_modified_at: None,
            },
        };

        let json = sonic_rs::to_string(&outcome).unwrap();
        assert!(json.contains("\"tokenType\":\"Bearer\""));
        assert!(json.contains("\"expiresAt\""));
        assert!(!json.contains("argon2id"));
    }
}
