use std::time::Duration;

use catchup_engine::progress::format_hms;
use catchup_engine::{AttemptOutcome, EventReceiver, SupervisorEvent};
use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

fn status_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Draws supervisor events as a single live status line.
pub struct Renderer {
    bar: ProgressBar,
    colored: bool,
    current: Option<String>,
}

impl Renderer {
    pub fn new(bar: ProgressBar, colored: bool) -> Self {
        bar.set_style(status_style());
        Self {
            bar,
            colored,
            current: None,
        }
    }

    /// Consumes events until every sender is dropped.
    pub async fn run(mut self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.bar.finish_and_clear();
    }

    pub fn handle(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Started {
                title,
                destination,
                total_seconds,
            } => {
                self.bar.println(format!(
                    "{} {} ({}) -> {}",
                    self.colorize("Downloading", Color::Cyan, true),
                    title,
                    format_hms(total_seconds),
                    destination.display()
                ));
                self.bar.set_message(format!("{title}: starting"));
                self.bar.enable_steady_tick(Duration::from_millis(200));
                self.current = Some(title);
            }
            SupervisorEvent::Progress(sample) => {
                let title = self.current.as_deref().unwrap_or_default();
                self.bar.set_message(format!("{title}: {sample}"));
            }
            SupervisorEvent::Diagnostic(text) => {
                self.bar.println(format!("  {}", self.colorize(&text, Color::BrightBlack, false)));
            }
            SupervisorEvent::Finished {
                sample,
                size_bytes,
                wall_clock,
            } => {
                self.stop();
                self.bar.println(format!(
                    "  {sample} | {} in {}",
                    crate::utils::format_bytes(size_bytes),
                    crate::utils::format_duration(wall_clock)
                ));
            }
            SupervisorEvent::Aborted { reason } => {
                self.stop();
                self.bar
                    .println(format!("  {}", self.colorize(&format!("Aborted: {reason}"), Color::Red, false)));
            }
            SupervisorEvent::Outcome { title, outcome } => {
                self.bar.println(self.outcome_line(&title, &outcome));
            }
            SupervisorEvent::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    fn stop(&mut self) {
        self.bar.disable_steady_tick();
        self.bar.set_message("");
        self.current = None;
    }

    /// `[  OK  ] title: completed (...)` with a color per outcome.
    pub fn outcome_line(&self, title: &str, outcome: &AttemptOutcome) -> String {
        let (label, color) = match outcome {
            outcome if outcome.is_success() => ("  OK  ", Color::Green),
            AttemptOutcome::Skipped => (" SKIP ", Color::Yellow),
            AttemptOutcome::Unavailable { .. } => (" N/A  ", Color::Yellow),
            _ => (" FAIL ", Color::Red),
        };
        let detail = match outcome {
            AttemptOutcome::Completed {
                size_bytes,
                wall_clock,
            } => format!(
                "completed ({} in {})",
                crate::utils::format_bytes(*size_bytes),
                crate::utils::format_duration(*wall_clock)
            ),
            AttemptOutcome::Available { total_seconds } => {
                format!("available ({})", format_hms(*total_seconds))
            }
            other => other.to_string(),
        };
        format!("[{}] {title}: {detail}", self.colorize(label, color, true))
    }

    fn colorize(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.colored {
            return text.to_string();
        }
        let colored = text.color(color);
        if bold {
            colored.bold().to_string()
        } else {
            colored.to_string()
        }
    }
}
