pub mod callback;
mod config;
pub mod credential_store;
pub mod device_flow;
pub mod gateway;
pub mod interaction;
pub mod login;
mod session;

pub use callback::{
    wait_for_callback, CallbackCode, CallbackError, CallbackErrorKind, CallbackListener,
};
pub use config::{config_dir, Settings};
pub use credential_store::{CredentialStore, FileCredentialStore};
pub use device_flow::{DeviceFlow, DeviceFlowError};
pub use gateway::{AuthGateway, GatewayError, SupabaseGateway};
pub use interaction::{BrowserOpener, Prompter, SystemBrowser, Validator};
pub use login::{LoginError, LoginMethod, LoginOptions, LoginOrchestrator, LoginOutcome};
pub use session::{resume_session, ActiveSession, SessionError};

use crate::error::AuthError;

/// Loads and validates settings, the first step of every networked command
pub fn load_settings() -> Result<Settings, AuthError> {
    let settings = Settings::new()?;
    settings.validate().map_err(AuthError::Configuration)?;
    Ok(settings)
}
