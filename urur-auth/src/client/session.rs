use thiserror::Error;

use crate::client::credential_store::CredentialStore;
use crate::client::gateway::{AuthGateway, GatewayError};
use crate::common::{Session, User};
use crate::error::AuthError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Run `urur login` first.")]
    NotLoggedIn,

    #[error("Session is no longer valid ({0}). Run `urur login` again.")]
    Invalid(GatewayError),

    #[error(transparent)]
    Storage(#[from] AuthError),
}

/// A stored session that the backend has just accepted
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session: Session,
    pub user: User,
}

/// Loads the stored session, refreshing it when close to expiry, and
/// confirms it with the backend. A refreshed session replaces the stored one.
pub async fn resume_session(
    gateway: &dyn AuthGateway,
    store: &dyn CredentialStore,
) -> Result<ActiveSession, SessionError> {
    let stored = store.load().ok_or(SessionError::NotLoggedIn)?;

    let session = gateway
        .set_session(&stored)
        .await
        .map_err(SessionError::Invalid)?;
    if session != stored {
        store.save(&session)?;
        tracing::info!("Refreshed session saved");
    }

    let user = gateway
        .get_user(&session)
        .await
        .map_err(SessionError::Invalid)?;

    Ok(ActiveSession { session, user })
}
