use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::{
    error::AppError,
    handlers,
    middleware_layer::{
        basic_auth::require_basic_auth, bearer_auth::require_bearer_auth,
        deadline::enforce_deadline,
    },
    state::AppState,
};

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Builds the full HTTP surface.
///
/// Registration and login sit behind the basic-credential gate; everything
/// else sits behind the bearer gate. The deadline wraps both gates.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/v1/account/registration", post(handlers::account::register))
        .route("/v1/account/login", post(handlers::account::login))
        .route_layer(from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state.clone());

    let account_routes = Router::new()
        .route("/v1/account", get(handlers::account::profile))
        .route("/v1/account/logout", post(handlers::account::logout))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth))
        .with_state(state.clone());

    let article_routes = Router::new()
        .route("/v1/article/create", post(handlers::article::create))
        .route("/v1/article/update", put(handlers::article::update))
        .route("/v1/article/delete/{id}", delete(handlers::article::delete))
        .route("/v1/article/publish/{id}", put(handlers::article::publish))
        .route("/v1/article/findbyid/{id}", get(handlers::article::find_by_id))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(article_routes)
        .fallback(not_found)
        .layer(from_fn_with_state(state, enforce_deadline))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
}
