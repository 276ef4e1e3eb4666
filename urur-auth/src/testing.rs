//! In-memory stand-ins for the backend, the credential file and the terminal.
//! Used by the crate's own tests and by the `urur` command tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use url::Url;

use crate::client::credential_store::CredentialStore;
use crate::client::gateway::{AuthGateway, GatewayError};
use crate::client::interaction::{BrowserOpener, Prompter, Validator};
use crate::common::{
    AuthenticatedSession, DeviceAuthorization, PollOutcome, Session, User, UserMetadata,
};
use crate::error::AuthError;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A session valid for another hour
pub fn sample_session() -> Session {
    Session {
        access_token: "access-token".into(),
        refresh_token: "refresh-token".into(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn sample_user() -> User {
    User {
        id: "5d1f3c2a-0000-4000-8000-000000000001".into(),
        email: Some("octo@example.com".into()),
        user_metadata: UserMetadata {
            user_name: Some("octocat".into()),
            full_name: Some("Octo Cat".into()),
        },
    }
}

#[derive(Debug, Default)]
struct GatewayCalls {
    set_session: usize,
    sign_in: usize,
    redirect_uris: Vec<String>,
    exchanged_codes: Vec<String>,
    sent_otps: Vec<String>,
    verified_codes: Vec<String>,
    device_codes_requested: usize,
    polled_codes: Vec<String>,
}

/// Backend double answering from a fixed script. Unscripted operations fail
/// with a backend error.
pub struct ScriptedGateway {
    user: Option<User>,
    refreshed: Option<Session>,
    session_valid: bool,
    oauth_base: String,
    issued_session: Option<AuthenticatedSession>,
    otp_code: Option<String>,
    device_code: Option<DeviceAuthorization>,
    polls: Mutex<VecDeque<Result<PollOutcome, String>>>,
    calls: Mutex<GatewayCalls>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            user: Some(sample_user()),
            refreshed: None,
            session_valid: true,
            oauth_base: "https://auth.example.test/authorize".into(),
            issued_session: None,
            otp_code: None,
            device_code: None,
            polls: Mutex::new(VecDeque::new()),
            calls: Mutex::new(GatewayCalls::default()),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Stored sessions are rejected by `set_session`
    pub fn with_invalid_session(mut self) -> Self {
        self.session_valid = false;
        self
    }

    /// `set_session` answers with this session instead of echoing its input
    pub fn with_refreshed_session(mut self, session: Session) -> Self {
        self.refreshed = Some(session);
        self
    }

    /// Session returned by code exchange and OTP verification
    pub fn with_issued_session(mut self, session: AuthenticatedSession) -> Self {
        self.issued_session = Some(session);
        self
    }

    /// The only passcode `verify_otp` accepts
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        self.otp_code = Some(code.into());
        self
    }

    pub fn with_device_code(mut self, authorization: DeviceAuthorization) -> Self {
        self.device_code = Some(authorization);
        self
    }

    /// Outcomes returned by successive polls; `pending` once exhausted
    pub fn with_polls(self, outcomes: impl IntoIterator<Item = PollOutcome>) -> Self {
        lock(&self.polls).extend(outcomes.into_iter().map(Ok));
        self
    }

    pub fn with_poll_failure(self, message: impl Into<String>) -> Self {
        lock(&self.polls).push_back(Err(message.into()));
        self
    }

    pub fn set_session_count(&self) -> usize {
        lock(&self.calls).set_session
    }

    pub fn sign_in_count(&self) -> usize {
        lock(&self.calls).sign_in
    }

    pub fn redirect_uris(&self) -> Vec<String> {
        lock(&self.calls).redirect_uris.clone()
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        lock(&self.calls).exchanged_codes.clone()
    }

    pub fn sent_otps(&self) -> Vec<String> {
        lock(&self.calls).sent_otps.clone()
    }

    pub fn verified_codes(&self) -> Vec<String> {
        lock(&self.calls).verified_codes.clone()
    }

    pub fn device_code_requests(&self) -> usize {
        lock(&self.calls).device_codes_requested
    }

    pub fn poll_count(&self) -> usize {
        lock(&self.calls).polled_codes.len()
    }

    pub fn polled_codes(&self) -> Vec<String> {
        lock(&self.calls).polled_codes.clone()
    }

    fn issued(&self) -> Result<AuthenticatedSession, GatewayError> {
        self.issued_session
            .clone()
            .ok_or_else(|| GatewayError::Backend("No session scripted".into()))
    }
}

#[async_trait]
impl AuthGateway for ScriptedGateway {
    async fn set_session(&self, session: &Session) -> Result<Session, GatewayError> {
        lock(&self.calls).set_session += 1;
        if !self.session_valid {
            return Err(GatewayError::Backend("Invalid Refresh Token".into()));
        }
        Ok(self.refreshed.clone().unwrap_or_else(|| session.clone()))
    }

    async fn get_user(&self, _session: &Session) -> Result<User, GatewayError> {
        self.user
            .clone()
            .ok_or_else(|| GatewayError::Backend("User not found".into()))
    }

    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<String, GatewayError> {
        {
            let mut calls = lock(&self.calls);
            calls.sign_in += 1;
            calls.redirect_uris.push(redirect_uri.to_string());
        }
        let url = Url::parse_with_params(
            &self.oauth_base,
            &[("provider", provider), ("redirect_to", redirect_uri)],
        )?;
        Ok(url.to_string())
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> Result<AuthenticatedSession, GatewayError> {
        lock(&self.calls).exchanged_codes.push(code.to_string());
        self.issued()
    }

    async fn send_otp(&self, email: &str) -> Result<(), GatewayError> {
        lock(&self.calls).sent_otps.push(email.to_string());
        Ok(())
    }

    async fn verify_otp(
        &self,
        _email: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, GatewayError> {
        lock(&self.calls).verified_codes.push(code.to_string());
        match &self.otp_code {
            Some(expected) if expected == code => self.issued(),
            _ => Err(GatewayError::Backend("Token has expired or is invalid".into())),
        }
    }

    async fn request_device_code(&self) -> Result<DeviceAuthorization, GatewayError> {
        lock(&self.calls).device_codes_requested += 1;
        self.device_code
            .clone()
            .ok_or_else(|| GatewayError::Backend("No device code scripted".into()))
    }

    async fn poll_token(&self, device_code: &str) -> Result<PollOutcome, GatewayError> {
        lock(&self.calls).polled_codes.push(device_code.to_string());
        match lock(&self.polls).pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(GatewayError::Backend(message)),
            None => Ok(PollOutcome::Pending),
        }
    }
}

/// Credential store kept in memory, counting writes
#[derive(Default)]
pub struct InMemoryCredentialStore {
    session: Mutex<Option<Session>>,
    saves: Mutex<usize>,
    clears: Mutex<usize>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::default();
        *lock(&store.session) = Some(session);
        store
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }

    pub fn clear_count(&self) -> usize {
        *lock(&self.clears)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Option<Session> {
        self.current()
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        *lock(&self.saves) += 1;
        *lock(&self.session) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *lock(&self.clears) += 1;
        *lock(&self.session) = None;
        Ok(())
    }
}

/// Answers prompts from queues. Running out of answers is an error, so an
/// unexpected question fails the test instead of hanging.
#[derive(Default)]
pub struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    selections: Mutex<VecDeque<usize>>,
    asked: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(self, answer: bool) -> Self {
        lock(&self.confirms).push_back(answer);
        self
    }

    pub fn input_with(self, answer: impl Into<String>) -> Self {
        lock(&self.inputs).push_back(answer.into());
        self
    }

    pub fn select_with(self, index: usize) -> Self {
        lock(&self.selections).push_back(index);
        self
    }

    /// Every prompt message, in order
    pub fn asked(&self) -> Vec<String> {
        lock(&self.asked).clone()
    }

    /// Input answers the validator turned down
    pub fn rejected(&self) -> Vec<String> {
        lock(&self.rejected).clone()
    }

    fn record(&self, message: &str) {
        lock(&self.asked).push(message.to_string());
    }
}

fn exhausted(message: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("no scripted answer for {:?}", message),
    )
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _default: bool) -> io::Result<bool> {
        self.record(message);
        lock(&self.confirms)
            .pop_front()
            .ok_or_else(|| exhausted(message))
    }

    fn input(&self, message: &str, validate: Validator<'_>) -> io::Result<String> {
        self.record(message);
        loop {
            let answer = lock(&self.inputs)
                .pop_front()
                .ok_or_else(|| exhausted(message))?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(_) => lock(&self.rejected).push(answer),
            }
        }
    }

    fn select(&self, message: &str, _items: &[&str], _default: usize) -> io::Result<usize> {
        self.record(message);
        lock(&self.selections)
            .pop_front()
            .ok_or_else(|| exhausted(message))
    }
}

/// Records opened URLs. Can act as the user's browser by following the
/// redirect URI embedded in the opened URL.
#[derive(Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
    callback_query: Option<String>,
    fail: bool,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// On open, request `<redirect uri>?<query>` as the provider would
    pub fn redirecting_with(query: impl Into<String>) -> Self {
        Self {
            callback_query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }

    fn redirect_target(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == "redirect_to" || key == "redirect_uri")
            .map(|(_, value)| value.into_owned())
    }
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        lock(&self.opened).push(url.to_string());
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no browser available"));
        }

        if let (Some(query), Some(target)) = (&self.callback_query, Self::redirect_target(url)) {
            let callback = format!("{}?{}", target, query);
            tokio::spawn(async move {
                if let Err(e) = reqwest::get(&callback).await {
                    tracing::warn!("Simulated redirect failed: {}", e);
                }
            });
        }
        Ok(())
    }
}
