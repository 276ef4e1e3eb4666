use chrono::{Duration, TimeZone, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::common::{AuthenticatedSession, Session, User};

// Auth backend requests

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PkceExchangeRequest<'a> {
    pub auth_code: &'a str,
    pub code_verifier: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OtpRequest<'a> {
    pub email: &'a str,
    pub create_user: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub email: &'a str,
    pub token: &'a str,
}

// Token broker requests

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BrokerRequest<'a> {
    DeviceCode,
    PollToken {
        #[serde(rename = "deviceCode")]
        device_code: &'a str,
    },
}

// Responses

#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
    pub user: Option<User>,
}

impl SessionResponse {
    /// Backends may answer 2xx without a session (e.g. pending confirmation)
    pub fn into_authenticated(self, fallback_name: &str) -> Result<AuthenticatedSession, GatewayError> {
        let (Some(access_token), Some(refresh_token)) = (self.access_token, self.refresh_token)
        else {
            return Err(GatewayError::MissingSession);
        };

        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => Utc.timestamp_opt(at, 0).single().unwrap_or_default(),
            (None, Some(secs)) => Utc::now() + Duration::seconds(secs),
            (None, None) => Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
        };

        let display_name = self
            .user
            .map(|user| user.display_name())
            .filter(|name| name != "unknown")
            .unwrap_or_else(|| fallback_name.to_string());

        Ok(AuthenticatedSession {
            session: Session {
                access_token,
                refresh_token,
                expires_at,
            },
            display_name,
        })
    }
}

/// Error bodies differ between backend services; take whichever field is set
#[derive(Debug, Default, Deserialize)]
pub struct BackendErrorBody {
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
}

impl BackendErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Debug)]
pub enum GatewayError {
    Http(reqwest::Error),
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    Url(url::ParseError),
    MissingSession,
    MissingVerifier,
    Backend(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status {
                status,
                message: Some(msg),
            } => write!(f, "{} (HTTP {})", msg, status.as_u16()),
            Self::Status {
                status,
                message: None,
            } => write!(f, "Backend returned HTTP {}", status.as_u16()),
            Self::Url(e) => write!(f, "Invalid URL: {}", e),
            Self::MissingSession => write!(f, "No session was returned"),
            Self::MissingVerifier => write!(f, "No OAuth sign-in is in progress"),
            Self::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}
