use url::Url;

use super::{spinner, LoginError, LoginOrchestrator};
use crate::client::callback::CallbackListener;
use crate::client::gateway::GatewayError;
use crate::common::AuthenticatedSession;

pub(super) async fn login(
    ctx: &LoginOrchestrator<'_>,
) -> Result<AuthenticatedSession, LoginError> {
    // Bound before anything else so a busy port fails fast
    let listener = CallbackListener::bind(ctx.options.port).await?;
    let redirect_uri = listener.redirect_uri();

    let oauth_url = ctx
        .gateway
        .sign_in_with_oauth(&ctx.options.provider, &redirect_uri)
        .await
        .map_err(LoginError::OAuth)?;
    let url = consent_url(ctx.options.web_consent_url.as_deref(), &oauth_url, &redirect_uri)?;

    ctx.open_in_browser(&url);

    let progress = spinner("Waiting for authorization in your browser...");
    let result = listener.wait(ctx.options.callback_timeout).await;
    progress.finish_and_clear();
    let callback = result?;

    ctx.gateway
        .exchange_code_for_session(&callback.code)
        .await
        .map_err(LoginError::Exchange)
}

/// The provider URL, or the hosted consent page wrapping it when one is configured
pub fn consent_url(
    consent_page: Option<&str>,
    oauth_url: &str,
    redirect_uri: &str,
) -> Result<String, LoginError> {
    let Some(page) = consent_page else {
        return Ok(oauth_url.to_string());
    };

    Url::parse_with_params(page, &[("oauth_url", oauth_url), ("redirect_uri", redirect_uri)])
        .map(|url| url.to_string())
        .map_err(|e| LoginError::OAuth(GatewayError::Url(e)))
}
