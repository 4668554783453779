pub mod auth;

use serde::Serialize;
use utoipa::ToSchema;

/// Generic error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
