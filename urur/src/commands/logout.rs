use anyhow::Result;
use console::style;
use std::process::ExitCode;
use urur_auth::CredentialStore;

/// Works without a configured backend; only the credential file is touched
pub fn run(store: &dyn CredentialStore) -> Result<ExitCode> {
    if store.load().is_none() {
        println!("{}", style("Not logged in.").yellow());
        return Ok(ExitCode::SUCCESS);
    }

    store.clear()?;
    tracing::info!("Credentials removed");
    println!("{}", style("Logged out.").green());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use urur_auth::testing::{sample_session, InMemoryCredentialStore};

    #[test]
    fn clears_stored_session() {
        let store = InMemoryCredentialStore::with_session(sample_session());

        assert_eq!(run(&store).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.current(), None);
        assert_eq!(store.clear_count(), 1);
    }

    #[test]
    fn logged_out_user_is_not_an_error() {
        let store = InMemoryCredentialStore::new();

        assert_eq!(run(&store).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.clear_count(), 0);
    }
}
