use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::io;
use urur_auth::{Prompter, Validator};

/// Terminal prompts rendered with dialoguer
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn confirm(&self, message: &str, default: bool) -> io::Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|dialoguer::Error::IO(e)| e)
    }

    fn input(&self, message: &str, validate: Validator<'_>) -> io::Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .validate_with(|value: &String| validate(value))
            .interact_text()
            .map_err(|dialoguer::Error::IO(e)| e)
    }

    fn select(&self, message: &str, items: &[&str], default: usize) -> io::Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(default)
            .interact()
            .map_err(|dialoguer::Error::IO(e)| e)
    }
}
