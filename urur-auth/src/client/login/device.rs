use console::style;

use super::{spinner, LoginError, LoginOrchestrator};
use crate::client::device_flow::DeviceFlow;
use crate::common::AuthenticatedSession;

pub(super) async fn login(
    ctx: &LoginOrchestrator<'_>,
) -> Result<AuthenticatedSession, LoginError> {
    let flow = DeviceFlow::new(ctx.gateway);
    let authorization = flow.request_code().await?;

    println!();
    println!(
        "Enter the code {} at {}",
        style(&authorization.user_code).cyan().bold(),
        authorization.verification_uri
    );
    ctx.open_in_browser(&authorization.verification_uri);

    let progress = spinner("Waiting for authorization...");
    let result = flow
        .poll_for_session(
            &authorization.device_code,
            authorization.interval,
            authorization.expires_in,
        )
        .await;
    progress.finish_and_clear();

    Ok(result?.into())
}
