pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
pub mod prompt;
pub mod validation;

pub use cli::{Cli, Command};
pub use context::AppContext;
