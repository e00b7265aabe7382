use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session metadata kept, encrypted, under `account:session:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The ID of the account this session belongs to.
    pub account_id: i64,
    pub email: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the cache drops the record.
    pub expires_at: DateTime<Utc>,
}
