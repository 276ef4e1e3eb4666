use serde::{Deserialize, Serialize};
use tower_api_client::{Error as ApiError, StatusCode};

#[derive(Debug)]
pub enum DirectoryApiError {
    Directory(StatusCode, ErrorDetail),
    Config(String),
    Internal(ApiError),
}

impl From<ApiError> for DirectoryApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, body) | ApiError::ServerError(status, body) => {
                DirectoryApiError::Directory(status, ErrorDetail::from_body(status, &body))
            }
            e => DirectoryApiError::Internal(e),
        }
    }
}

impl std::fmt::Display for DirectoryApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryApiError::Internal(e) => write!(f, "Internal error: {}", e),
            DirectoryApiError::Config(message) => write!(f, "Invalid configuration: {}", message),
            DirectoryApiError::Directory(status, detail) => match &detail.code {
                Some(code) => write!(f, "({}) {}: {}", status, code, detail.message),
                None => write!(f, "({}) {}", status, detail.message),
            },
        }
    }
}

impl std::error::Error for DirectoryApiError {}

/// PostgREST error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl ErrorDetail {
    /// Decode a PostgREST error, keeping anything else (proxy pages, plain
    /// text) as the message
    fn from_body(status: StatusCode, body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| ErrorDetail {
            code: None,
            message: if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                body.trim().to_string()
            },
            details: None,
            hint: None,
        })
    }
}
