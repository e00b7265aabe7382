use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use garde::Validate;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON body decoded with sonic-rs and checked with garde before the
/// handler sees it.
///
/// Undecodable bodies are `MalformedRequest`; decodable bodies that break a
/// field rule are `Validation`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    T::Context: Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::MalformedRequest(e.body_text()))?;

        let value: T = sonic_rs::from_slice(&bytes)
            .map_err(|e| AppError::MalformedRequest(format!("Invalid JSON body: {}", e)))?;

        value
            .validate()
            .map_err(|report| AppError::Validation(report.to_string()))?;

        Ok(ValidatedJson(value))
    }
}
