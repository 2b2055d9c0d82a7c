use catchup_engine::{EngineError, Prompter};
use indicatif::ProgressBar;
use inquire::Text;

/// Prompts on the terminal with `inquire`.
///
/// Informational lines go through the progress bar so they don't tear the
/// status line.
pub struct TerminalPrompter {
    bar: ProgressBar,
}

impl TerminalPrompter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for TerminalPrompter {
    fn show(&self, line: &str) {
        self.bar.println(line);
    }

    fn ask(&self, question: &str) -> catchup_engine::Result<String> {
        self.bar
            .suspend(|| Text::new(question).prompt())
            .map_err(|e| EngineError::Prompt(e.to_string()))
    }
}
