use chrono::Utc;

use crate::{
    error::{AppError, Result},
    models::article::{Article, ArticleChanges, ArticleStatus, NewArticle},
    state::AppState,
};

/// Editable article text, as received from a request.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub title: String,
    pub subtitle: String,
    pub content: String,
}

/// Loads an article and checks `account_id` wrote it.
async fn load_owned(state: &AppState, account_id: i64, article_id: i64) -> Result<Article> {
    let article = state
        .articles
        .find_by_id(article_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if article.author_id != account_id {
        tracing::warn!(
            "🚫 Account {} tried to modify article {} owned by {}",
            account_id,
            article_id,
            article.author_id
        );
        return Err(AppError::Forbidden);
    }

    Ok(article)
}

/// Creates a draft authored by `author_id`.
pub async fn create(state: &AppState, author_id: i64, draft: ArticleDraft) -> Result<Article> {
    let article = state
        .articles
        .save(NewArticle {
            author_id,
            title: draft.title,
            subtitle: draft.subtitle,
            content: draft.content,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!("✅ Article {} created by account {}", article.id, author_id);
    Ok(article)
}

/// Replaces an article's text. Only its author may do this.
pub async fn update(
    state: &AppState,
    account_id: i64,
    article_id: i64,
    draft: ArticleDraft,
) -> Result<Article> {
    load_owned(state, account_id, article_id).await?;

    let article = state
        .articles
        .update(ArticleChanges {
            id: article_id,
            title: draft.title,
            subtitle: draft.subtitle,
            content: draft.content,
            last_modified_at: Utc::now(),
        })
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✏️ Article {} updated", article.id);
    Ok(article)
}

/// Deletes an article. Only its author may do this.
pub async fn delete(state: &AppState, account_id: i64, article_id: i64) -> Result<()> {
    load_owned(state, account_id, article_id).await?;

    if !state.articles.delete(article_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Article {} deleted", article_id);
    Ok(())
}

/// Marks an article published. Publishing twice keeps the first publish time.
pub async fn publish(state: &AppState, account_id: i64, article_id: i64) -> Result<Article> {
    let article = load_owned(state, account_id, article_id).await?;

    if article.status == ArticleStatus::Published {
        return Ok(article);
    }

    let article = state
        .articles
        .set_status(article_id, ArticleStatus::Published, Some(Utc::now()))
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("📰 Article {} published", article.id);
    Ok(article)
}

/// Any authenticated account may read any article.
pub async fn find_by_id(state: &AppState, article_id: i64) -> Result<Article> {
    state
        .articles
        .find_by_id(article_id)
        .await?
        .ok_or(AppError::NotFound)
}
