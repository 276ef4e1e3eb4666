use anyhow::Result;
use std::sync::Arc;
use urur_auth::{
    AuthGateway, BrowserOpener, CredentialStore, FileCredentialStore, Prompter, Settings,
    SupabaseGateway, SystemBrowser,
};

use crate::prompt::DialoguerPrompter;

/// Collaborators shared by the networked commands
pub struct AppContext {
    pub settings: Settings,
    pub gateway: Arc<dyn AuthGateway>,
    pub store: Arc<dyn CredentialStore>,
    pub prompter: Arc<dyn Prompter>,
    pub browser: Arc<dyn BrowserOpener>,
}

impl AppContext {
    /// Wire the real backend, credential file and terminal
    pub fn new(settings: Settings) -> Result<Self> {
        let gateway = SupabaseGateway::from_settings(&settings)?;
        let store = FileCredentialStore::from_settings(&settings)?;
        tracing::debug!(credentials = %store.path().display(), "Using credential store");

        Ok(Self {
            settings,
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            prompter: Arc::new(DialoguerPrompter::new()),
            browser: Arc::new(SystemBrowser),
        })
    }

    /// Directory client acting as the signed-in user
    pub fn directory_client(&self, access_token: &str) -> Result<urur_api::Client> {
        let client = urur_api::Client::new(&self.settings.backend_url, &self.settings.anon_key)?;
        Ok(client.bearer_auth(access_token))
    }
}
