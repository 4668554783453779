//! Request body extraction with field validation.
//!
//! Handlers take `ValidatedJson<T>` instead of `Json<T>` so malformed or
//! out-of-policy bodies are rejected before any service code runs. Parse
//! failures map to 400, field validation failures to 422, both with the
//! same error envelope the rest of the API uses.

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let resp = ErrorResponse {
                error: format!("Malformed request body: {}", e),
            };
            (StatusCode::BAD_REQUEST, Json(resp)).into_response()
        })?;

        body.validate().map_err(|e| {
            let resp = ErrorResponse {
                error: format!("Invalid request: {}", e),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(resp)).into_response()
        })?;

        Ok(ValidatedJson(body))
    }
}
