use axum::{extract::State, http::StatusCode, response::Response, Extension};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    models::claims::AuthenticatedAccount,
    response::ApiResponse,
    services::account as account_service,
    state::AppState,
    validation::{
        json::ValidatedJson,
        rules::{not_blank, password_policy},
    },
};

/// The request payload for account registration.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[garde(email, length(max = 255))]
    pub email: String,
    #[garde(length(min = 8, max = 128), custom(password_policy))]
    pub password: String,
    #[garde(length(max = 100), custom(not_blank))]
    pub first_name: String,
    #[garde(length(max = 100), custom(not_blank))]
    pub last_name: String,
}

/// The request payload for login.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// Handles account registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Response> {
    let account = account_service::register(
        &state,
        &payload.email,
        payload.password,
        payload.first_name,
        payload.last_name,
    )
    .await?;

    Ok(ApiResponse::success("Registration successful", account)
        .into_response_with(StatusCode::CREATED))
}

/// Handles login. Issues a bearer token and opens a session.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Response> {
    let outcome = account_service::login(&state, &payload.email, payload.password).await?;
    Ok(ApiResponse::success("Login successful", outcome).into_response_with(StatusCode::OK))
}

/// Returns the caller's account.
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
) -> Result<Response> {
    let account = account_service::profile(&state, &identity).await?;
    Ok(ApiResponse::success("Account retrieved", account).into_response_with(StatusCode::OK))
}

/// Ends the caller's session.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedAccount>,
) -> Result<Response> {
    account_service::logout(&state, &identity).await?;
    Ok(ApiResponse::ok("Logged out").into_response_with(StatusCode::OK))
}
