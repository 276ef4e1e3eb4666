use anyhow::Result;
use console::style;
use std::process::ExitCode;
use urur_auth::{LoginMethod, LoginOptions, LoginOrchestrator, LoginOutcome};

use super::report_failure;
use crate::cli::LoginArgs;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, args: &LoginArgs) -> Result<ExitCode> {
    let mut options = LoginOptions::from_settings(&ctx.settings);
    options.method = args.method.map(LoginMethod::from);
    if let Some(port) = args.port {
        options.port = port;
    }

    let orchestrator = LoginOrchestrator::new(
        ctx.gateway.as_ref(),
        ctx.store.as_ref(),
        ctx.prompter.as_ref(),
        ctx.browser.as_ref(),
        options,
    );

    match orchestrator.run().await {
        Ok(LoginOutcome::LoggedIn {
            method,
            display_name,
        }) => {
            tracing::info!(?method, "Logged in");
            println!(
                "{} Logged in as {}",
                style("✓").green().bold(),
                style(&display_name).bold()
            );
            println!("Run `urur submit` to list your product.");
            Ok(ExitCode::SUCCESS)
        }
        Ok(LoginOutcome::KeptExisting { .. }) => {
            println!("Keeping the current session.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            report_failure(&format!("Login failed: {}", e), e.hint());
            Ok(ExitCode::FAILURE)
        }
    }
}
