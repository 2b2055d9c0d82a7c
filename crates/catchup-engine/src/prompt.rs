//! Operator interaction.
//!
//! The engine decides what to ask and how to read the answer; a [`Prompter`]
//! only moves text to and from the operator.

use std::path::Path;

use crate::Result;
use crate::model::StreamVariant;

pub trait Prompter: Send + Sync {
    /// Shows an informational line to the operator.
    fn show(&self, line: &str);

    /// Asks a question and returns the raw answer. No timeout.
    fn ask(&self, question: &str) -> Result<String>;
}

/// Asks whether an existing file should be replaced. Anything but an
/// explicit yes keeps the file.
pub fn confirm_overwrite(prompter: &dyn Prompter, path: &Path) -> Result<bool> {
    let answer = prompter.ask(&format!("{} already exists. Overwrite? [y/N]", path.display()))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Lists the ranked variants and reads a zero-based index, defaulting to 0.
pub fn choose_variant(prompter: &dyn Prompter, variants: &[StreamVariant]) -> Result<usize> {
    if variants.len() <= 1 {
        return Ok(0);
    }

    prompter.show("Available qualities:");
    for (index, variant) in variants.iter().enumerate() {
        prompter.show(&format!("  [{index}] {variant}"));
    }

    loop {
        let answer = prompter.ask(&format!("Select quality [0-{}] (default 0)", variants.len() - 1))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(0);
        }
        match answer.parse::<usize>() {
            Ok(index) if index < variants.len() => return Ok(index),
            _ => prompter.show(&format!("Invalid selection: {answer}")),
        }
    }
}
