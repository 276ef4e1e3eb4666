use std::io;

/// Inline check run on every answer; `Err` carries the message to show
pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Terminal questions asked during a command. Implementations re-ask until
/// the validator accepts the answer.
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool>;

    fn input(&self, message: &str, validate: Validator<'_>) -> io::Result<String>;

    /// Returns the index of the chosen item
    fn select(&self, message: &str, items: &[&str], default: usize) -> io::Result<usize>;
}

pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs with the platform's default browser
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}
