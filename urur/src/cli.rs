use clap::{Args, Parser, Subcommand, ValueEnum};
use urur_auth::LoginMethod;

/// CLI for urur.dev, the indie product directory
#[derive(Parser)]
#[command(name = "urur", version, about = "CLI for urur.dev - indie product directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in with GitHub or an email passcode
    #[command(after_help = "Examples:\n  $ urur login\n  $ urur login --port 3000\n  $ urur login --method device")]
    Login(LoginArgs),

    /// Log out (delete stored credentials)
    #[command(after_help = "Deletes ~/.urur/credentials.json.")]
    Logout,

    /// Submit a product to the directory
    #[command(after_help = "Examples:\n  $ urur submit -i\n  $ urur submit --name \"My App\" --url \"https://example.com\"\n\nWithout --name and --url the form is filled in interactively.")]
    Submit(SubmitArgs),

    /// Show the logged-in user
    #[command(after_help = "Shows the GitHub user name and email address.\nIf you are not logged in, run \"urur login\".")]
    Whoami,
}

#[derive(Args, Default)]
pub struct LoginArgs {
    /// Port for the local OAuth callback
    #[arg(long)]
    pub port: Option<u16>,

    /// Sign-in method (asked when omitted)
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// GitHub in the browser, redirected back to a local port
    Browser,
    /// GitHub device code, for machines without a local browser
    Device,
    /// One-time passcode sent by email
    Email,
}

impl From<MethodArg> for LoginMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Browser => LoginMethod::BrowserOAuth,
            MethodArg::Device => LoginMethod::DeviceFlow,
            MethodArg::Email => LoginMethod::EmailOtp,
        }
    }
}

#[derive(Args, Default, Clone)]
pub struct SubmitArgs {
    /// Product name (required, up to 100 characters)
    #[arg(long)]
    pub name: Option<String>,

    /// Product URL (required)
    #[arg(long)]
    pub url: Option<String>,

    /// Tagline (up to 200 characters)
    #[arg(long)]
    pub tagline: Option<String>,

    /// Description (up to 2000 characters)
    #[arg(long)]
    pub description: Option<String>,

    /// Logo URL
    #[arg(long)]
    pub logo_url: Option<String>,

    /// Fill in the form interactively
    #[arg(short, long)]
    pub interactive: bool,
}
