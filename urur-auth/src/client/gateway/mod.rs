mod models;

pub use models::GatewayError;

use async_trait::async_trait;
use models::*;
use oauth2::{PkceCodeChallenge, PkceCodeVerifier};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::client::config::Settings;
use crate::common::{AuthenticatedSession, DeviceAuthorization, PollOutcome, Session, User};

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Single-shot operations against the identity backend. Retry policy lives
/// with the callers.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Returns a usable session, refreshing it first if it has expired
    async fn set_session(&self, session: &Session) -> Result<Session, GatewayError>;

    async fn get_user(&self, session: &Session) -> Result<User, GatewayError>;

    /// Returns the provider authorization URL for a browser-based sign-in
    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<String, GatewayError>;

    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> Result<AuthenticatedSession, GatewayError>;

    async fn send_otp(&self, email: &str) -> Result<(), GatewayError>;

    async fn verify_otp(&self, email: &str, code: &str)
        -> Result<AuthenticatedSession, GatewayError>;

    async fn request_device_code(&self) -> Result<DeviceAuthorization, GatewayError>;

    async fn poll_token(&self, device_code: &str) -> Result<PollOutcome, GatewayError>;
}

/// HTTP gateway for a Supabase-style backend: GoTrue under `/auth/v1` and
/// the device-code broker under `/functions/v1/cli-auth`
pub struct SupabaseGateway {
    http_client: Client,
    backend_url: String,
    anon_key: String,
    pkce_verifier: Mutex<Option<PkceCodeVerifier>>,
}

impl SupabaseGateway {
    pub fn new(
        backend_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            pkce_verifier: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, GatewayError> {
        Self::new(settings.backend_url.clone(), settings.anon_key.clone())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.backend_url, path)
    }

    fn broker_url(&self) -> String {
        format!("{}/functions/v1/cli-auth", self.backend_url)
    }

    fn request(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, GatewayError> {
        let resp = check_status(builder.send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    fn store_verifier(&self, verifier: Option<PkceCodeVerifier>) -> Option<PkceCodeVerifier> {
        let mut slot = self
            .pkce_verifier
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *slot, verifier)
    }
}

async fn check_status(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    // GoTrue and the broker disagree on the error field name
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendErrorBody>(&body)
        .ok()
        .and_then(BackendErrorBody::into_message);

    tracing::debug!(status = %status, "Backend request failed");
    Err(GatewayError::Status { status, message })
}

#[async_trait]
impl AuthGateway for SupabaseGateway {
    async fn set_session(&self, session: &Session) -> Result<Session, GatewayError> {
        if !session.is_expired() {
            return Ok(session.clone());
        }

        tracing::debug!("Stored session expired, refreshing");

        // Exchange the refresh token for a new pair
        let req = self
            .request(Method::POST, &self.auth_url("/token"), &self.anon_key)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshRequest {
                refresh_token: &session.refresh_token,
            });

        let resp: SessionResponse = Self::send_json(req).await?;
        let refreshed = resp.into_authenticated("")?;

        tracing::info!(expires_at = %refreshed.session.expires_at, "Session refreshed");
        Ok(refreshed.session)
    }

    async fn get_user(&self, session: &Session) -> Result<User, GatewayError> {
        let req = self.request(Method::GET, &self.auth_url("/user"), &session.access_token);
        Self::send_json(req).await
    }

    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<String, GatewayError> {
        // Generate PKCE challenge
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        // Build authorization URL
        let url = Url::parse_with_params(
            &self.auth_url("/authorize"),
            &[
                ("provider", provider),
                ("redirect_to", redirect_uri),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "s256"),
            ],
        )?;

        // Keep the verifier for the code exchange
        self.store_verifier(Some(verifier));
        tracing::debug!(provider = %provider, redirect_uri = %redirect_uri, "Issued OAuth URL");
        Ok(url.to_string())
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> Result<AuthenticatedSession, GatewayError> {
        let verifier = self
            .store_verifier(None)
            .ok_or(GatewayError::MissingVerifier)?;

        // Exchange authorization code for a session
        let req = self
            .request(Method::POST, &self.auth_url("/token"), &self.anon_key)
            .query(&[("grant_type", "pkce")])
            .json(&PkceExchangeRequest {
                auth_code: code,
                code_verifier: verifier.secret(),
            });

        let resp: SessionResponse = Self::send_json(req).await?;
        resp.into_authenticated("unknown")
    }

    async fn send_otp(&self, email: &str) -> Result<(), GatewayError> {
        let req = self
            .request(Method::POST, &self.auth_url("/otp"), &self.anon_key)
            .json(&OtpRequest {
                email,
                create_user: true,
            });

        check_status(req.send().await?).await?;
        tracing::debug!("One-time passcode sent");
        Ok(())
    }

    async fn verify_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, GatewayError> {
        let req = self
            .request(Method::POST, &self.auth_url("/verify"), &self.anon_key)
            .json(&VerifyOtpRequest {
                kind: "email",
                email,
                token: code,
            });

        let resp: SessionResponse = Self::send_json(req).await?;
        resp.into_authenticated(email)
    }

    async fn request_device_code(&self) -> Result<DeviceAuthorization, GatewayError> {
        let req = self
            .request(Method::POST, &self.broker_url(), &self.anon_key)
            .json(&BrokerRequest::DeviceCode);

        Self::send_json(req).await
    }

    async fn poll_token(&self, device_code: &str) -> Result<PollOutcome, GatewayError> {
        let req = self
            .request(Method::POST, &self.broker_url(), &self.anon_key)
            .json(&BrokerRequest::PollToken { device_code });

        Self::send_json(req).await
    }
}
