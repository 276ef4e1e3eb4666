//! `urur submit`: collect a listing, confirm it and insert it as the
//! signed-in user.

use anyhow::{Context, Result};
use console::style;
use std::io;
use std::process::ExitCode;
use urur_api::endpoints::services::NewService;
use urur_api::Request;
use urur_auth::{resume_session, Prompter};
use uuid::Uuid;

use super::{report_failure, session_failure};
use crate::cli::SubmitArgs;
use crate::context::AppContext;
use crate::validation::{
    validate_all, validate_description, validate_logo_url, validate_name, validate_tagline,
    validate_url, ServiceForm,
};

pub async fn run(ctx: &AppContext, args: &SubmitArgs) -> Result<ExitCode> {
    let active = match resume_session(ctx.gateway.as_ref(), ctx.store.as_ref()).await {
        Ok(active) => active,
        Err(e) => return session_failure(e),
    };

    let form = match (&args.name, &args.url, args.interactive) {
        (Some(name), Some(url), false) => {
            let form = ServiceForm::new(
                name.clone(),
                url.clone(),
                args.tagline.clone(),
                args.description.clone(),
                args.logo_url.clone(),
            );
            let errors = validate_all(&form);
            if !errors.is_empty() {
                for error in &errors {
                    report_failure(&format!("{}: {}", error.field.label(), error.message), None);
                }
                return Ok(ExitCode::FAILURE);
            }
            form
        }
        _ => collect_form(ctx.prompter.as_ref())?,
    };

    print_summary(&form);
    if !ctx.prompter.confirm("Submit this product?", true)? {
        println!("Submission cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let user_id = Uuid::parse_str(&active.user.id)
        .with_context(|| format!("Unexpected user id from backend: {}", active.user.id))?;
    let mut service = NewService::new(user_id, form.name.trim(), form.url.trim());
    if let Some(tagline) = form.tagline.clone() {
        service = service.tagline(tagline);
    }
    if let Some(description) = form.description.clone() {
        service = service.description(description);
    }
    if let Some(logo_url) = form.logo_url.clone() {
        service = service.logo_url(logo_url);
    }

    let client = ctx.directory_client(&active.session.access_token)?;
    match client.send(Request::services().create(service)).await {
        Ok(rows) => {
            tracing::info!(rows = rows.len(), "Service submitted");
            println!(
                "{} Submitted {}",
                style("✓").green().bold(),
                style(form.name.trim()).bold()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("Submission failed: {}", e);
            report_failure(&format!("Submission failed: {}", e), None);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Field-by-field entry; each answer is checked before moving on
fn collect_form(prompter: &dyn Prompter) -> io::Result<ServiceForm> {
    let name = prompter.input("Product name", &|v: &str| {
        validate_name(v).map_err(String::from)
    })?;
    let url = prompter.input("Product URL", &|v: &str| {
        validate_url(v).map_err(String::from)
    })?;
    let tagline = prompter.input("Tagline (optional)", &|v: &str| {
        validate_tagline(v).map_err(String::from)
    })?;
    let description = prompter.input("Description (optional)", &|v: &str| {
        validate_description(v).map_err(String::from)
    })?;
    let logo_url = prompter.input("Logo URL (optional)", &|v: &str| {
        validate_logo_url(v).map_err(String::from)
    })?;

    Ok(ServiceForm::new(
        name,
        url,
        Some(tagline),
        Some(description),
        Some(logo_url),
    ))
}

fn print_summary(form: &ServiceForm) {
    println!();
    println!("{}", style("Submission").bold().underlined());
    println!("  Name:        {}", form.name.trim());
    println!("  URL:         {}", form.url.trim());
    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  Tagline:     {}", optional(&form.tagline));
    println!("  Description: {}", optional(&form.description));
    println!("  Logo URL:    {}", optional(&form.logo_url));
    println!();
}
