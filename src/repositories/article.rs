use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::article::{Article, ArticleChanges, ArticleStatus, NewArticle},
};

/// Storage contract for articles. Lookups that miss return `None`/`false`.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn save(&self, article: NewArticle) -> Result<Article>;

    async fn update(&self, changes: ArticleChanges) -> Result<Option<Article>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Sets the status; a `Some` publish time replaces the stored one.
    async fn set_status(
        &self,
        id: i64,
        status: ArticleStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Article>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>>;
}

fn row_to_article(row: &Row) -> Result<Article> {
    Article::try_from(row).map_err(AppError::Internal)
}

/// PostgreSQL implementation over the `article` table.
#[derive(Clone)]
pub struct PgArticleRepository {
    pool: Pool,
}

impl PgArticleRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn save(&self, article: NewArticle) -> Result<Article> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                INSERT INTO article (author_id, title, subtitle, content, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, author_id, title, subtitle, content, status,
                          created_at, published_at, last_modified_at
                "#,
            )
            .await?;

        let row = client
            .query_one(
                &statement,
                &[
                    &article.author_id,
                    &article.title,
                    &article.subtitle,
                    &article.content,
                    &ArticleStatus::Draft.as_str(),
                    &article.created_at,
                ],
            )
            .await?;

        row_to_article(&row)
    }

    async fn update(&self, changes: ArticleChanges) -> Result<Option<Article>> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                UPDATE article
                SET title = $1, subtitle = $2, content = $3, last_modified_at = $4
                WHERE id = $5
                RETURNING id, author_id, title, subtitle, content, status,
                          created_at, published_at, last_modified_at
                "#,
            )
            .await?;

        let row = client
            .query_opt(
                &statement,
                &[
                    &changes.title,
                    &changes.subtitle,
                    &changes.content,
                    &changes.last_modified_at,
                    &changes.id,
                ],
            )
            .await?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached("DELETE FROM article WHERE id = $1")
            .await?;

        let affected = client.execute(&statement, &[&id]).await?;
        Ok(affected > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        status: ArticleStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Article>> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                UPDATE article
                SET status = $1, published_at = COALESCE($2, published_at)
                WHERE id = $3
                RETURNING id, author_id, title, subtitle, content, status,
                          created_at, published_at, last_modified_at
                "#,
            )
            .await?;

        let row = client
            .query_opt(&statement, &[&status.as_str(), &published_at, &id])
            .await?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                SELECT id, author_id, title, subtitle, content, status,
                       created_at, published_at, last_modified_at
                FROM article
                WHERE id = $1
                "#,
            )
            .await?;

        let row = client.query_opt(&statement, &[&id]).await?;
        row.as_ref().map(row_to_article).transpose()
    }
}
