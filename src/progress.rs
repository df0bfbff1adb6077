//! Terminal progress for reconciliation runs.

use colored::Colorize;
use declarative::{ActionKind, PlannedAction, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Create a bar for `len` actions
pub fn bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Clear without leaving a line
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Reports engine progress with spinners and per-server lines
///
/// Hidden when `quiet` so JSON output stays clean.
pub struct TerminalProgress {
    quiet: bool,
    current: Option<ProgressBar>,
    batch_failures: usize,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: None,
            batch_failures: 0,
        }
    }

    fn take(&mut self) -> Option<ProgressBar> {
        self.current.take()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_observe_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        self.current = Some(spinner(&format!(
            "Observing {}...",
            crate::ui::servers(count)
        )));
    }

    fn on_observe_complete(&mut self) {
        if let Some(pb) = self.take() {
            finish_clear(&pb);
        }
    }

    fn on_batch_start(&mut self, kind: ActionKind, count: usize) {
        self.batch_failures = 0;
        if self.quiet {
            return;
        }
        self.current = Some(bar(count as u64, &format!("{} servers", kind.label())));
    }

    fn on_action_complete(&mut self, action: &PlannedAction, succeeded: bool) {
        if !succeeded {
            self.batch_failures += 1;
        }
        let Some(pb) = &self.current else {
            return;
        };
        pb.inc(1);
        let marker = if succeeded { "✓".green() } else { "✗".red() };
        pb.println(format!("  {marker} {} {}", action.kind.label(), action.server));
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.take() {
            finish_clear(&pb);
        }
        if self.batch_failures > 0 {
            log::debug!("Batch finished with {} failures", self.batch_failures);
        }
    }
}
