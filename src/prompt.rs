//! Interactive input.
//!
//! Commands talk to the operator through [`Prompter`] so the `add` flow can be
//! driven by a scripted prompter in tests. [`InquirePrompter`] is the real one.

use anyhow::{Context, Result};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};

pub trait Prompter {
    /// Free-form line of input
    fn text(&self, message: &str) -> Result<String>;
    /// Masked input that is never echoed back
    fn secret(&self, message: &str) -> Result<String>;
    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// [`Prompter`] backed by `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn text(&self, message: &str) -> Result<String> {
        Text::new(message)
            .prompt()
            .with_context(|| format!("Prompt cancelled: {}", message.trim()))
    }

    fn secret(&self, message: &str) -> Result<String> {
        Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Hidden)
            .prompt()
            .with_context(|| format!("Prompt cancelled: {}", message.trim()))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new(message)
            .with_default(default)
            .prompt()
            .with_context(|| format!("Prompt cancelled: {}", message.trim()))
    }
}
