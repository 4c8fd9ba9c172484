//! Request and response bodies for `POST /uppercase` and `POST /count`.

use serde::{Deserialize, Serialize};

use crate::service::ServiceError;

// ---------------------------------------------------------------------------
// Uppercase
// ---------------------------------------------------------------------------

/// Body of `POST /uppercase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UppercaseRequest {
    pub s: String,
}

/// Response of `POST /uppercase`.
///
/// Business errors travel in-band: `v` is empty and `err` carries the
/// error message. `err` is omitted on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UppercaseResponse {
    pub v: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl From<Result<String, ServiceError>> for UppercaseResponse {
    fn from(result: Result<String, ServiceError>) -> Self {
        match result {
            Ok(v) => Self { v, err: None },
            Err(e) => Self {
                v: String::new(),
                err: Some(e.to_string()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Count
// ---------------------------------------------------------------------------

/// Body of `POST /count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRequest {
    pub s: String,
}

/// Response of `POST /count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub v: usize,
}
