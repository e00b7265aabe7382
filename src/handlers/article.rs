use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    models::claims::AuthenticatedAccount,
    response::ApiResponse,
    services::article::{self as article_service, ArticleDraft},
    state::AppState,
    validation::{
        json::ValidatedJson,
        rules::{not_blank, parse_id},
    },
};

/// The request payload for creating an article.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[garde(length(max = 255), custom(not_blank))]
    pub title: String,
    #[garde(length(max = 255))]
    #[serde(default)]
    pub subtitle: String,
    #[garde(custom(not_blank))]
    pub content: String,
}

/// The request payload for updating an article.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    #[garde(range(min = 1))]
    pub id: i64,
    #[garde(length(max = 255), custom(not_blank))]
    pub title: String,
    #[garde(length(max = 255))]
    #[serde(default)]
    pub subtitle: String,
    #[garde(custom(not_blank))]
    pub content: String,
}

/// Creates an article authored by the caller.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
    ValidatedJson(payload): ValidatedJson<CreateArticleRequest>,
) -> Result<Response> {
    let draft = ArticleDraft {
        title: payload.title,
        subtitle: payload.subtitle,
        content: payload.content,
    };
    let article = article_service::create(&state, identity.account_id, draft).await?;

    Ok(ApiResponse::success("Article created", article).into_response_with(StatusCode::CREATED))
}

#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
    ValidatedJson(payload): ValidatedJson<UpdateArticleRequest>,
) -> Result<Response> {
    let draft = ArticleDraft {
        title: payload.title,
        subtitle: payload.subtitle,
        content: payload.content,
    };
    let article =
        article_service::update(&state, identity.account_id, payload.id, draft).await?;

    Ok(ApiResponse::success("Article updated", article).into_response_with(StatusCode::OK))
}

#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    article_service::delete(&state, identity.account_id, id).await?;
    Ok(ApiResponse::ok("Article deleted").into_response_with(StatusCode::OK))
}

#[axum::debug_handler]
pub async fn publish(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let article = article_service::publish(&state, identity.account_id, id).await?;
    Ok(ApiResponse::success("Article published", article).into_response_with(StatusCode::OK))
}

/// Reads any article. Authorship is not required.
#[axum::debug_handler]
pub async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let article = article_service::find_by_id(&state, id).await?;
    Ok(ApiResponse::success("Article found", article).into_response_with(StatusCode::OK))
}
