//! `urur login`: existing-session detection, method selection and dispatch
//! to one of the three sign-in flows. A session is saved once, and only when
//! the chosen flow succeeds.

mod browser;
mod device;
mod otp;

pub use browser::consent_url;
pub use otp::MAX_OTP_ATTEMPTS;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use thiserror::Error;

use crate::client::callback::{CallbackError, CallbackErrorKind};
use crate::client::config::Settings;
use crate::client::credential_store::CredentialStore;
use crate::client::device_flow::DeviceFlowError;
use crate::client::gateway::{AuthGateway, GatewayError};
use crate::client::interaction::{BrowserOpener, Prompter};
use crate::common::Session;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    BrowserOAuth,
    DeviceFlow,
    EmailOtp,
}

impl LoginMethod {
    pub const ALL: [LoginMethod; 3] = [
        LoginMethod::BrowserOAuth,
        LoginMethod::DeviceFlow,
        LoginMethod::EmailOtp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LoginMethod::BrowserOAuth => "GitHub (browser)",
            LoginMethod::DeviceFlow => "GitHub (device code)",
            LoginMethod::EmailOtp => "Email one-time passcode",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOptions {
    /// Asked interactively when unset
    pub method: Option<LoginMethod>,
    pub port: u16,
    pub callback_timeout: Duration,
    pub provider: String,
    pub web_consent_url: Option<String>,
}

impl LoginOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            method: None,
            port: settings.callback_port,
            callback_timeout: settings.callback_timeout(),
            provider: settings.oauth_provider.clone(),
            web_consent_url: settings.web_consent_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn {
        method: LoginMethod,
        display_name: String,
    },
    /// The user chose to keep the session that was already stored
    KeptExisting { display_name: String },
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("OAuth error: {0}")]
    OAuth(GatewayError),

    #[error("Could not obtain a session: {0}")]
    Exchange(GatewayError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error(transparent)]
    DeviceFlow(#[from] DeviceFlowError),

    #[error("Could not send the one-time passcode: {0}")]
    SendOtp(GatewayError),

    #[error("The one-time passcode was rejected: {0}")]
    OtpRejected(GatewayError),

    #[error("Login cancelled")]
    OtpAborted,

    #[error(transparent)]
    Storage(#[from] AuthError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

impl LoginError {
    /// Corrective action for recoverable failures
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LoginError::Callback(e) => match e.kind {
                CallbackErrorKind::PortInUse => {
                    Some("Pass --port <N> to use a different callback port.")
                }
                CallbackErrorKind::Timeout | CallbackErrorKind::CallbackError => {
                    Some("Run `urur login` to try again.")
                }
            },
            LoginError::DeviceFlow(DeviceFlowError::Expired | DeviceFlowError::TimedOut) => {
                Some("Run `urur login` to get a new code.")
            }
            LoginError::OtpRejected(_) | LoginError::OtpAborted => {
                Some("Run `urur login` to request a new passcode.")
            }
            _ => None,
        }
    }
}

pub struct LoginOrchestrator<'a> {
    gateway: &'a dyn AuthGateway,
    store: &'a dyn CredentialStore,
    prompter: &'a dyn Prompter,
    browser: &'a dyn BrowserOpener,
    options: LoginOptions,
}

impl<'a> LoginOrchestrator<'a> {
    pub fn new(
        gateway: &'a dyn AuthGateway,
        store: &'a dyn CredentialStore,
        prompter: &'a dyn Prompter,
        browser: &'a dyn BrowserOpener,
        options: LoginOptions,
    ) -> Self {
        Self {
            gateway,
            store,
            prompter,
            browser,
            options,
        }
    }

    pub async fn run(&self) -> Result<LoginOutcome, LoginError> {
        if let Some(existing) = self.store.load() {
            let display_name = self.identify(&existing).await;
            println!(
                "{}",
                style(format!("Already logged in as {}", display_name)).green()
            );

            if !self.prompter.confirm("Log in again?", false)? {
                return Ok(LoginOutcome::KeptExisting { display_name });
            }
            self.store.clear()?;
        }

        let method = match self.options.method {
            Some(method) => method,
            None => self.select_method()?,
        };
        tracing::info!(?method, "Starting login");

        let authenticated = match method {
            LoginMethod::BrowserOAuth => browser::login(self).await?,
            LoginMethod::DeviceFlow => device::login(self).await?,
            LoginMethod::EmailOtp => otp::login(self).await?,
        };

        self.store.save(&authenticated.session)?;
        Ok(LoginOutcome::LoggedIn {
            method,
            display_name: authenticated.display_name,
        })
    }

    async fn identify(&self, session: &Session) -> String {
        let user = match self.gateway.set_session(session).await {
            Ok(active) => self.gateway.get_user(&active).await,
            Err(e) => Err(e),
        };

        match user {
            Ok(user) => user.display_name(),
            Err(e) => {
                tracing::warn!("Stored session could not be validated: {}", e);
                "unknown".to_string()
            }
        }
    }

    fn select_method(&self) -> Result<LoginMethod, LoginError> {
        let labels: Vec<&str> = LoginMethod::ALL.iter().map(LoginMethod::label).collect();
        let index = self
            .prompter
            .select("How would you like to log in?", &labels, 0)?;
        Ok(LoginMethod::ALL
            .get(index)
            .copied()
            .unwrap_or(LoginMethod::BrowserOAuth))
    }

    /// Best effort; the URL is printed so it can be opened by hand
    fn open_in_browser(&self, url: &str) {
        if let Err(e) = self.browser.open(url) {
            tracing::warn!("Failed to open browser: {}", e);
            println!("Could not open a browser automatically. Open this URL:");
        } else {
            println!("Opened your browser. If nothing happened, open this URL:");
        }
        println!("  {}\n", style(url).underlined());
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
