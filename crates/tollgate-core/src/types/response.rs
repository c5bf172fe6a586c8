//! Response types for API endpoints.

use serde::{Deserialize, Serialize};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether retrying the same request later may succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub retryable: bool,
}
