use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Publication state of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "DRAFT",
            ArticleStatus::Published => "PUBLISHED",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ArticleStatus::Draft),
            "PUBLISHED" => Ok(ArticleStatus::Published),
            other => Err(format!("unknown article status: {}", other)),
        }
    }
}

/// Represents an article in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<&Row> for Article {
    type Error = String;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let status: String = row.get("status");
        Ok(Self {
            id: row.get("id"),
            author_id: row.get("author_id"),
            title: row.get("title"),
            subtitle: row.get("subtitle"),
            content: row.get("content"),
            status: status.parse()?,
            created_at: row.get("created_at"),
            published_at: row.get("published_at"),
            last_modified_at: row.get("last_modified_at"),
        })
    }
}

/// The fields needed to insert an article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The editable fields of an existing article.
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub last_modified_at: DateTime<Utc>,
}
