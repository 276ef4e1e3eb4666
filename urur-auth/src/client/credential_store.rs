use crate::client::config::Settings;
use crate::common::Session;
use crate::error::AuthError;
use std::fs;
use std::path::{Path, PathBuf};

/// Owner of the on-disk session record
pub trait CredentialStore: Send + Sync {
    /// Missing or unreadable credentials are reported as absent
    fn load(&self) -> Option<Session>;

    fn save(&self, session: &Session) -> Result<(), AuthError>;

    /// Removing credentials that do not exist is not an error
    fn clear(&self) -> Result<(), AuthError>;
}

pub struct FileCredentialStore {
    credentials_path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
        }
    }

    /// Store at `~/.urur/credentials.json`
    pub fn default_location() -> Result<Self, AuthError> {
        Ok(Self::new(super::config::config_dir()?.join("credentials.json")))
    }

    /// Honors `credentials_path` from the settings, else the default location
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        match &settings.credentials_path {
            Some(path) => Ok(Self::new(path)),
            None => Self::default_location(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.credentials_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .credentials_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials.json".into());
        name.push(".tmp");
        self.credentials_path.with_file_name(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Session> {
        let json = match fs::read_to_string(&self.credentials_path) {
            Ok(json) => json,
            Err(_) => return None,
        };

        match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    path = %self.credentials_path.display(),
                    "Ignoring unreadable credentials file: {}",
                    e
                );
                None
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(dir) = self.credentials_path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                AuthError::CredentialStorage(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, json)
            .map_err(|e| AuthError::CredentialStorage(format!("Failed to save credentials: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::CredentialStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.credentials_path)
            .map_err(|e| AuthError::CredentialStorage(format!("Failed to save credentials: {}", e)))?;

        tracing::info!(path = %self.credentials_path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.credentials_path) {
            Ok(()) => {
                tracing::info!(path = %self.credentials_path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::CredentialStorage(format!(
                "Failed to delete credentials: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.json"));

        assert_eq!(store.load(), None);
        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(&session()).unwrap();
        let mut newer = session();
        newer.access_token = "newer".to_string();
        store.save(&newer).unwrap();

        assert_eq!(store.load().unwrap().access_token, "newer");
    }

    #[test]
    fn corrupt_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();

        assert_eq!(FileCredentialStore::new(path).load(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.clear().unwrap();
        store.save(&session()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[cfg(unix)]
    #[test]
    fn credentials_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&session()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
