use console::style;

use super::{LoginError, LoginOrchestrator};
use crate::client::gateway::GatewayError;
use crate::common::AuthenticatedSession;

/// Wrong codes accepted before a resend is offered
pub const MAX_OTP_ATTEMPTS: u32 = 3;

pub(super) async fn login(
    ctx: &LoginOrchestrator<'_>,
) -> Result<AuthenticatedSession, LoginError> {
    let email = ctx.prompter.input("Email address", &validate_email)?;
    let email = email.trim().to_string();

    ctx.gateway
        .send_otp(&email)
        .await
        .map_err(LoginError::SendOtp)?;
    println!("A one-time passcode was sent to {}", style(&email).cyan());

    for attempt in 1..=MAX_OTP_ATTEMPTS {
        match verify(ctx, &email).await? {
            Ok(session) => return Ok(session),
            Err(e) => {
                tracing::warn!(attempt, "Passcode rejected: {}", e);
                let remaining = MAX_OTP_ATTEMPTS - attempt;
                if remaining > 0 {
                    println!(
                        "{}",
                        style(format!("Invalid code. {} attempt(s) left.", remaining)).red()
                    );
                }
            }
        }
    }

    println!(
        "{}",
        style(format!("The code was rejected {} times.", MAX_OTP_ATTEMPTS)).red()
    );
    if !ctx.prompter.confirm("Send a new code?", true)? {
        return Err(LoginError::OtpAborted);
    }

    ctx.gateway
        .send_otp(&email)
        .await
        .map_err(LoginError::SendOtp)?;
    println!("A new passcode was sent to {}", style(&email).cyan());

    verify(ctx, &email).await?.map_err(LoginError::OtpRejected)
}

async fn verify(
    ctx: &LoginOrchestrator<'_>,
    email: &str,
) -> Result<Result<AuthenticatedSession, GatewayError>, LoginError> {
    let code = ctx
        .prompter
        .input("Code from the email", &validate_code)?;
    Ok(ctx.gateway.verify_otp(email, code.trim()).await)
}

fn validate_email(value: &str) -> Result<(), String> {
    if value.contains('@') {
        Ok(())
    } else {
        Err("Enter a valid email address".to_string())
    }
}

fn validate_code(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("Enter the code".to_string())
    } else {
        Ok(())
    }
}
