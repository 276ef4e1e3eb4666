mod settings;

pub use settings::Settings;

use std::path::PathBuf;

use crate::error::AuthError;

/// Per-user directory holding credentials, config and logs (`~/.urur`)
pub fn config_dir() -> Result<PathBuf, AuthError> {
    dirs::home_dir()
        .map(|home| home.join(".urur"))
        .ok_or_else(|| AuthError::Configuration("Could not find home directory".to_string()))
}
