use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::crypto::keys::{KeyMaterial, SIGNING_ALGORITHM};
use crate::models::claims::Claims;

/// Token failures. Callers outside this module only ever see them as one
/// unauthorized outcome; the variants exist for logs and tests.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token signature mismatch")]
    Signature,

    #[error("token expired")]
    Expired,

    /// `now + lifetime` does not fit a unix timestamp.
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
}

/// A freshly signed token together with the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and verifies RS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<KeyMaterial>,
    lifetime: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(keys: Arc<KeyMaterial>, lifetime: Duration) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            keys,
            lifetime,
            validation,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Builds claims stamped `iat = now`, `exp = now + lifetime` and signs them.
    pub fn issue(&self, account_id: i64, email: &str) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.lifetime.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or(TokenError::LifetimeOutOfRange)?;

        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp,
        };

        let token = self.sign(&claims)?;
        tracing::debug!("Issued token for account {}", claims.sub);

        Ok(IssuedToken { token, claims })
    }

    /// Signs `claims` verbatim.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(
            &Header::new(SIGNING_ALGORITHM),
            claims,
            self.keys.encoding_key(),
        )
        .map_err(TokenError::Signing)
    }

    /// Checks structure, signature and expiry, in that order.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(classify)?;
        let claims = data.claims;

        // jsonwebtoken accepts exp == now; the token must still be strictly live.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        if claims.account_id().is_none() {
            return Err(TokenError::InvalidToken(
                "subject is not a positive integer".to_string(),
            ));
        }

        Ok(claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::Signature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidToken(err.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::keys::tests::{PRIVATE_PEM, PUBLIC_PEM};
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    pub(crate) fn token_service() -> TokenService {
        let keys = KeyMaterial::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap();
        TokenService::new(Arc::new(keys), Duration::from_secs(3600))
    }

    #[test]
    fn oversized_lifetime_is_refused_not_wrapped() {
        let keys = KeyMaterial::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap();
        let service = TokenService::new(Arc::new(keys), Duration::from_secs(u64::MAX));

        assert!(matches!(
            service.issue(13, "a@b.com"),
            Err(TokenError::LifetimeOutOfRange)
        ));
    }

    #[test]
    fn issued_tokens_verify_back_to_their_claims() {
        let service = token_service();
        let issued = service.issue(13, "a@b.com").unwrap();

        let claims = service.verify(&issued.token).unwrap();
        let now = Utc::now().timestamp();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "13");
        assert_eq!(claims.email, "a@b.com");
        assert!(claims.iat <= now && now <= claims.exp);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_has_three_base64url_segments_with_rs256_header() {
        let issued = token_service().issue(13, "a@b.com").unwrap();
        let segments: Vec<&str> = issued.token.split('.').collect();
        assert_eq!(segments.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["typ"], "JWT");

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
        assert_eq!(payload["sub"], "13");
        assert_eq!(payload["email"], "a@b.com");
        assert!(payload["iat"].is_i64());
        assert!(payload["exp"].is_i64());
    }

    #[test]
    fn any_changed_character_is_rejected() {
        let service = token_service();
        let token = service.issue(13, "a@b.com").unwrap().token;
        let payload_range = {
            let first_dot = token.find('.').unwrap();
            let last_dot = token.rfind('.').unwrap();
            first_dot + 1..last_dot
        };

        for (index, original) in token.char_indices() {
            if original == '.' {
                continue;
            }
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, &replacement.to_string());

            let result = service.verify(&tampered);
            assert!(result.is_err(), "tampered byte {} was accepted", index);
            if payload_range.contains(&index) {
                assert!(
                    matches!(result, Err(TokenError::Signature)),
                    "payload byte {} gave {:?}",
                    index,
                    result
                );
            }
        }
    }

    #[test]
    fn expired_token_with_valid_signature_is_rejected() {
        let service = token_service();
        let now = Utc::now().timestamp();
        let token = service
            .sign(&Claims {
                sub: "13".to_string(),
                email: "a@b.com".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let service = token_service();
        let now = Utc::now().timestamp();
        let token = service
            .sign(&Claims {
                sub: "13".to_string(),
                email: "a@b.com".to_string(),
                iat: now - 10,
                exp: now,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn malformed_structure_is_invalid() {
        let service = token_service();
        for token in ["", "abc", "a.b", "a.b.c", "....", "x.y.z.w"] {
            assert!(
                matches!(service.verify(token), Err(TokenError::InvalidToken(_))),
                "{:?} was not treated as malformed",
                token
            );
        }
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let service = token_service();
        let now = Utc::now().timestamp();
        let token = service
            .sign(&Claims {
                sub: "admin".to_string(),
                email: "a@b.com".to_string(),
                iat: now,
                exp: now + 60,
            })
            .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn symmetric_algorithm_tokens_are_refused() {
        let service = token_service();
        let now = Utc::now().timestamp();
        let forged = jsonwebtoken::encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &Claims {
                sub: "13".to_string(),
                email: "a@b.com".to_string(),
                iat: now,
                exp: now + 60,
            },
            &jsonwebtoken::EncodingKey::from_secret(PUBLIC_PEM),
        )
        .unwrap();

        assert!(matches!(service.verify(&forged), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn token_signed_by_other_key_is_a_signature_error() {
        let service = token_service();
        let issued = service.issue(13, "a@b.com").unwrap();

        // Swap in a signature over a different message from the same key.
        let other = service.issue(14, "c@d.com").unwrap();
        let (message, _) = issued.token.rsplit_once('.').unwrap();
        let (_, foreign_signature) = other.token.rsplit_once('.').unwrap();
        let spliced = format!("{}.{}", message, foreign_signature);

        assert!(matches!(service.verify(&spliced), Err(TokenError::Signature)));
    }
}
