//! OAuth 2.0 Device Authorization Grant against the token broker.
//!
//! One code is requested, then the broker is polled on `interval` until it
//! reports a terminal outcome or `expires_in` seconds have elapsed. Only one
//! poll is ever in flight.

use std::time::Duration;
use thiserror::Error;

use crate::client::gateway::{AuthGateway, GatewayError};
use crate::common::{DeviceAuthorization, DeviceFlowSession, PollOutcome};

/// Added to the polling interval each time the broker answers `slow_down`
pub const SLOW_DOWN_STEP_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum DeviceFlowError {
    #[error("Token broker error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("The authorization code expired. Run `urur login` again.")]
    Expired,

    #[error("Authorization timed out. Run `urur login` again.")]
    TimedOut,

    #[error("{0}")]
    Denied(String),
}

pub struct DeviceFlow<'a> {
    gateway: &'a dyn AuthGateway,
}

impl<'a> DeviceFlow<'a> {
    pub fn new(gateway: &'a dyn AuthGateway) -> Self {
        Self { gateway }
    }

    pub async fn request_code(&self) -> Result<DeviceAuthorization, DeviceFlowError> {
        let authorization = self.gateway.request_device_code().await?;
        tracing::debug!(
            interval = authorization.interval,
            expires_in = authorization.expires_in,
            "Device code issued"
        );
        Ok(authorization)
    }

    pub async fn poll_for_session(
        &self,
        device_code: &str,
        interval: u64,
        expires_in: u64,
    ) -> Result<DeviceFlowSession, DeviceFlowError> {
        // A zero interval would spin without ever reaching the deadline
        let mut interval = interval.max(1);
        let mut elapsed = 0;

        while elapsed < expires_in {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            elapsed += interval;

            if elapsed >= expires_in {
                break;
            }

            match self.gateway.poll_token(device_code).await? {
                PollOutcome::Success { session } => {
                    tracing::info!(elapsed, "Device authorization completed");
                    return Ok(session);
                }
                PollOutcome::Pending => continue,
                PollOutcome::SlowDown => {
                    interval += SLOW_DOWN_STEP_SECS;
                    tracing::debug!(interval, "Broker asked to slow down");
                }
                PollOutcome::Expired => return Err(DeviceFlowError::Expired),
                PollOutcome::Error { message } => return Err(DeviceFlowError::Denied(message)),
            }
        }

        tracing::warn!(elapsed, expires_in, "Device authorization timed out");
        Err(DeviceFlowError::TimedOut)
    }
}
