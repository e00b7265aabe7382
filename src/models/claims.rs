use serde::{Deserialize, Serialize};

/// The signed payload of a bearer token.
///
/// Field names are the registered JWT claim names so tokens stay readable by
/// any standard JWT library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id, string-encoded.
    pub sub: String,
    pub email: String,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expires at, unix seconds.
    pub exp: i64,
}

impl Claims {
    /// The account id carried in `sub`, if it is a positive integer.
    pub fn account_id(&self) -> Option<i64> {
        self.sub.parse::<i64>().ok().filter(|id| *id > 0)
    }
}

/// The identity the bearer gate binds into a request.
///
/// Only constructed from verified claims, so `account_id` is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub account_id: i64,
    pub email: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl AuthenticatedAccount {
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Self {
            account_id: claims.account_id()?,
            email: claims.email.clone(),
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "a@b.com".to_string(),
            iat: 0,
            exp: 1,
        }
    }

    #[test]
    fn subject_must_be_a_positive_integer() {
        assert_eq!(claims("13").account_id(), Some(13));
        assert_eq!(claims("0").account_id(), None);
        assert_eq!(claims("-4").account_id(), None);
        assert_eq!(claims("13a").account_id(), None);
        assert_eq!(claims("").account_id(), None);
    }

    #[test]
    fn identity_requires_valid_subject() {
        let identity = AuthenticatedAccount::from_claims(&claims("13")).unwrap();
        assert_eq!(identity.account_id, 13);
        assert_eq!(identity.email, "a@b.com");
        assert!(AuthenticatedAccount::from_claims(&claims("abc")).is_none());
    }
}
