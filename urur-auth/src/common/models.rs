use chrono::{serde::ts_seconds, DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// Session persisted in the credentials file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Treats tokens as expired 5 minutes early so they are refreshed before use
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + EXPIRY_BUFFER
    }
}

/// A freshly issued session together with a name to greet the user with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub session: Session,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserMetadata {
    pub user_name: Option<String>,
    pub full_name: Option<String>,
}

/// Identity behind a session, as reported by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl User {
    pub fn display_name(&self) -> String {
        self.user_metadata
            .user_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// Token broker wire shapes (camelCase on the wire)

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorization {
    pub user_code: String,
    pub verification_uri: String,
    pub device_code: String,
    /// Seconds until the device code expires
    pub expires_in: u64,
    /// Seconds to wait between polls
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFlowSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user_name: String,
}

impl From<DeviceFlowSession> for AuthenticatedSession {
    fn from(session: DeviceFlowSession) -> Self {
        Self {
            session: Session {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
                expires_at: Utc
                    .timestamp_opt(session.expires_at, 0)
                    .single()
                    .unwrap_or_default(),
            },
            display_name: session.user_name,
        }
    }
}

/// Result of a single poll against the token broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    Pending,
    SlowDown,
    Expired,
    Success { session: DeviceFlowSession },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_serializes_expiry_as_epoch_seconds() {
        let session = Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({"access_token": "a", "refresh_token": "r", "expires_at": 1_700_000_000})
        );
    }

    #[test]
    fn session_expires_inside_buffer() {
        let mut session = Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() + Duration::minutes(2),
        };
        assert!(session.is_expired());

        session.expires_at = Utc::now() + Duration::hours(1);
        assert!(!session.is_expired());
    }

    #[test]
    fn poll_outcome_parses_every_status() {
        let cases = [
            (json!({"status": "pending"}), PollOutcome::Pending),
            (json!({"status": "slow_down"}), PollOutcome::SlowDown),
            (json!({"status": "expired"}), PollOutcome::Expired),
            (
                json!({"status": "error", "message": "access_denied"}),
                PollOutcome::Error {
                    message: "access_denied".into(),
                },
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(serde_json::from_value::<PollOutcome>(value).unwrap(), expected);
        }

        let success: PollOutcome = serde_json::from_value(json!({
            "status": "success",
            "session": {
                "accessToken": "at",
                "refreshToken": "rt",
                "expiresAt": 1_700_000_000,
                "userName": "ghuser"
            }
        }))
        .unwrap();
        let PollOutcome::Success { session } = success else {
            panic!("expected success");
        };
        let authenticated = AuthenticatedSession::from(session);
        assert_eq!(authenticated.display_name, "ghuser");
        assert_eq!(authenticated.session.expires_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "user@example.com",
            "user_metadata": {}
        }))
        .unwrap();
        assert_eq!(user.display_name(), "user@example.com");

        let anonymous: User = serde_json::from_value(json!({"id": "u2"})).unwrap();
        assert_eq!(anonymous.display_name(), "unknown");
    }
}
