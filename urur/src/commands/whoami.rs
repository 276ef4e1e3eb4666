use anyhow::Result;
use std::process::ExitCode;
use urur_auth::resume_session;

use super::session_failure;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> Result<ExitCode> {
    let active = match resume_session(ctx.gateway.as_ref(), ctx.store.as_ref()).await {
        Ok(active) => active,
        Err(e) => return session_failure(e),
    };

    let metadata = &active.user.user_metadata;
    println!(
        "GitHub: {}",
        metadata.user_name.as_deref().unwrap_or("(not linked)")
    );
    println!("Email:  {}", active.user.email.as_deref().unwrap_or("(none)"));
    if let Some(full_name) = &metadata.full_name {
        println!("Name:   {}", full_name);
    }

    Ok(ExitCode::SUCCESS)
}
