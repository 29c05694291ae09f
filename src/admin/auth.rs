//! Tracker API access control and rejections.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Non-standard status used for a missing or unknown `action`.
pub const ACTION_REJECTED_STATUS: u16 = 420;

/// Characters of each key echoed back on a mismatch.
const KEY_HINT_LEN: usize = 4;

/// A query the tracker API refuses to answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiRejection {
    #[error("Only GET method supported")]
    MethodNotAllowed(Method),

    #[error("api-key parameter missing")]
    MissingApiKey,

    #[error("API key {supplied}... does not match {expected}...")]
    InvalidApiKey { supplied: String, expected: String },

    #[error("action parameter missing")]
    MissingAction,

    #[error("Invalid action parameter {0}")]
    InvalidAction(String),
}

impl ApiRejection {
    // 500 for a wrong method and 420 for a bad action are kept for client compatibility.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiRejection::MethodNotAllowed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiRejection::MissingApiKey | ApiRejection::InvalidApiKey { .. } => StatusCode::FORBIDDEN,
            ApiRejection::MissingAction | ApiRejection::InvalidAction(_) => {
                StatusCode::from_u16(ACTION_REJECTED_STATUS).unwrap_or(StatusCode::BAD_REQUEST)
            }
        }
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

fn hint(key: &str) -> String {
    key.chars().take(KEY_HINT_LEN).collect()
}

/// Check method and API key for a tracker API query.
pub fn authenticate(
    api_key: &str,
    method: &Method,
    supplied_key: Option<&str>,
) -> Result<(), ApiRejection> {
    if method != Method::GET {
        return Err(ApiRejection::MethodNotAllowed(method.clone()));
    }

    let supplied = match supplied_key {
        Some(key) if !key.is_empty() => key,
        _ => return Err(ApiRejection::MissingApiKey),
    };

    if supplied != api_key {
        return Err(ApiRejection::InvalidApiKey {
            supplied: hint(supplied),
            expected: hint(api_key),
        });
    }

    Ok(())
}
