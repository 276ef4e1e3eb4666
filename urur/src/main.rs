use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use urur::commands::{self, report_failure};
use urur::{AppContext, Cli, Command};
use urur_auth::{FileCredentialStore, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logging is best effort; commands work without it
    let _log_guard = match urur::logging::init_logging() {
        Ok((_, guard)) => Some(guard),
        Err(_) => None,
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Unexpected error: {:#}", e);
            report_failure(&format!("{:#}", e), None);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Command::Logout = cli.command {
        // A broken or missing backend config must not prevent logging out
        let settings = Settings::new().unwrap_or_default();
        let store = FileCredentialStore::from_settings(&settings)?;
        return commands::logout::run(&store);
    }

    let settings = match urur_auth::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            report_failure(&e.to_string(), None);
            print_config_help();
            return Ok(ExitCode::FAILURE);
        }
    };
    let ctx = AppContext::new(settings)?;

    match cli.command {
        Command::Login(args) => commands::login::run(&ctx, &args).await,
        Command::Submit(args) => commands::submit::run(&ctx, &args).await,
        Command::Whoami => commands::whoami::run(&ctx).await,
        Command::Logout => Ok(ExitCode::SUCCESS),
    }
}

fn print_config_help() {
    eprintln!("\nSet the backend in ~/.urur/config.toml (or the file named by URUR_CONFIG):");
    eprintln!("\nbackend_url = \"https://your-project.supabase.co\"");
    eprintln!("anon_key = \"your-anon-key\"");
    eprintln!("\nor export URUR_BACKEND_URL and URUR_ANON_KEY.");
}
