// Shared session and device-flow types
pub mod common;

// Credential storage, backend gateway and the login flows
mod client;
mod error;

// Always expose testing module (the `urur` tests need it)
pub mod testing;

pub use client::*;
pub use common::{AuthenticatedSession, DeviceAuthorization, PollOutcome, Session, User};
pub use error::AuthError;
