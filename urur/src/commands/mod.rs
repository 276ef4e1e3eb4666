pub mod login;
pub mod logout;
pub mod submit;
pub mod whoami;

use anyhow::Result;
use console::style;
use std::process::ExitCode;
use urur_auth::SessionError;

/// Print a classified failure in red, with an optional corrective hint
pub fn report_failure(message: &str, hint: Option<&str>) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
    if let Some(hint) = hint {
        eprintln!("  {}", style(hint).yellow());
    }
}

pub(crate) fn session_failure(err: SessionError) -> Result<ExitCode> {
    match err {
        SessionError::NotLoggedIn => {
            report_failure("Not logged in.", Some("Run `urur login` to log in."));
            Ok(ExitCode::FAILURE)
        }
        SessionError::Invalid(e) => {
            tracing::warn!("Stored session rejected: {}", e);
            report_failure(
                &format!("Your session has expired or is invalid ({}).", e),
                Some("Run `urur login` to log in again."),
            );
            Ok(ExitCode::FAILURE)
        }
        SessionError::Storage(e) => Err(e.into()),
    }
}
