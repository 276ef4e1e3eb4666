use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_anon_key")]
    pub anon_key: String,

    /// Hosted page that wraps the provider's consent screen. Without it the
    /// provider URL is opened directly.
    #[serde(default = "default_web_consent_url")]
    pub web_consent_url: Option<String>,

    #[serde(default = "default_oauth_provider")]
    pub oauth_provider: String,

    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,

    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_backend_url() -> String {
    option_env!("URUR_BACKEND_URL").unwrap_or_default().to_string()
}

fn default_anon_key() -> String {
    option_env!("URUR_ANON_KEY").unwrap_or_default().to_string()
}

fn default_web_consent_url() -> Option<String> {
    option_env!("URUR_WEB_CONSENT_URL").map(str::to_string)
}

fn default_oauth_provider() -> String {
    "github".to_string()
}

fn default_callback_port() -> u16 {
    8976
}

fn default_callback_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            anon_key: default_anon_key(),
            web_consent_url: default_web_consent_url(),
            oauth_provider: default_oauth_provider(),
            callback_port: default_callback_port(),
            callback_timeout_secs: default_callback_timeout_secs(),
            credentials_path: None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = match std::env::var("URUR_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => super::config_dir()
                .map(|dir| dir.join("config.toml"))
                .unwrap_or_else(|_| PathBuf::from("config.toml")),
        };

        Self::load(&config_path)
    }

    /// Layer an optional TOML file under `URUR_*` environment variables
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(config::Environment::with_prefix("URUR").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.backend_url.is_empty() {
            return Err("backend_url is required".to_string());
        }
        if !self.backend_url.starts_with("http") {
            return Err("backend_url must be a valid HTTP(S) URL".to_string());
        }
        if self.anon_key.is_empty() {
            return Err("anon_key is required".to_string());
        }
        Ok(())
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_values_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
backend_url = "https://backend.example.com"
anon_key = "anon"
web_consent_url = "https://urur.dev/cli/consent"
callback_port = 3000
"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.backend_url, "https://backend.example.com");
        assert_eq!(settings.anon_key, "anon");
        assert_eq!(
            settings.web_consent_url.as_deref(),
            Some("https://urur.dev/cli/consent")
        );
        assert_eq!(settings.callback_port, 3000);
        assert_eq!(settings.callback_timeout(), Duration::from_secs(60));
        assert_eq!(settings.oauth_provider, "github");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_backend() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let mut settings = Settings::load(file.path()).unwrap();

        settings.backend_url = String::new();
        assert!(settings.validate().is_err());

        settings.backend_url = "ftp://backend".to_string();
        assert!(settings.validate().is_err());

        settings.backend_url = "https://backend.example.com".to_string();
        settings.anon_key = String::new();
        assert_eq!(settings.validate().unwrap_err(), "anon_key is required");
    }
}
