//! Status Reporter
//!
//! Renders live status lines and the final run report. Rendering is a pure
//! function of its inputs; only [`Reporter::emit`] prints.

use std::env;
use std::io::{self, IsTerminal};

use colored::{ColoredString, Colorize};

use crate::provision::state::{Outcome, Phase, RunState, StepRecord};

/// Severity label of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Info => text.blue().bold(),
            Self::Success => text.green().bold(),
            Self::Warning => text.yellow().bold(),
            Self::Error => text.red().bold(),
        }
    }
}

impl From<&Outcome> for Level {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Pending | Outcome::Skipped(_) => Self::Info,
            Outcome::Succeeded => Self::Success,
            Outcome::Warned(_) => Self::Warning,
            Outcome::Failed(_) => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reporter {
    colorize: bool,
}

impl Reporter {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    /// Uncolored output, for logs and tests.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Colors only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn for_terminal() -> Self {
        Self::new(io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none())
    }

    /// Formats `[LABEL] message`.
    pub fn line(&self, level: Level, message: &str) -> String {
        let tag = format!("[{}]", level.label());
        if self.colorize {
            format!("{} {}", level.paint(&tag), message)
        } else {
            format!("{} {}", tag, message)
        }
    }

    pub fn emit(&self, level: Level, message: &str) {
        println!("{}", self.line(level, message));
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// Status line for a single recorded outcome.
    pub fn record_line(&self, record: &StepRecord) -> String {
        let level = Level::from(&record.outcome);
        let message = match record.outcome.reason() {
            Some(reason) => format!("{}: {} ({})", record.label(), record.outcome.kind(), reason),
            None => format!("{}: {}", record.label(), record.outcome.kind()),
        };
        self.line(level, &message)
    }

    /// Full end-of-run report.
    pub fn report(&self, state: &RunState) -> String {
        let mut lines = Vec::new();

        match state.started_at() {
            Some(started) => lines.push(format!(
                "Provisioning report (started {})",
                started.format("%Y-%m-%d %H:%M:%S")
            )),
            None => lines.push("Provisioning report".to_string()),
        }

        for record in state.records() {
            let mut line = self.record_line(record);
            if !record.elapsed.is_zero() {
                line.push_str(&format!(" [{:.1}s]", record.elapsed.as_secs_f64()));
            }
            lines.push(line);
        }

        for step in state.pending_steps() {
            lines.push(self.line(Level::Info, &format!("{}: pending", step)));
        }

        let tally = state.tally();
        lines.push(format!(
            "{} succeeded, {} skipped, {} warned, {} failed, {} pending",
            tally.succeeded, tally.skipped, tally.warned, tally.failed, tally.pending
        ));

        let elapsed = state
            .elapsed()
            .map(|d| format!(" in {:.1}s", d.num_milliseconds() as f64 / 1000.0))
            .unwrap_or_default();

        let (level, summary) = match state.phase() {
            Phase::Completed if tally.warned > 0 => (
                Level::Warning,
                format!("Provisioning completed with {} warning(s){}", tally.warned, elapsed),
            ),
            Phase::Completed => (Level::Success, format!("Provisioning completed{}", elapsed)),
            Phase::Aborted => {
                let failed_step = state
                    .records()
                    .iter()
                    .rev()
                    .find(|record| matches!(record.outcome, Outcome::Failed(_)))
                    .map(StepRecord::label)
                    .unwrap_or_default();
                (
                    Level::Error,
                    format!("Provisioning aborted at '{}'{}", failed_step, elapsed),
                )
            }
            Phase::VoluntaryExit(reason) => {
                (Level::Info, format!("Provisioning stopped: {}", reason))
            }
            Phase::NotStarted | Phase::Running(_) => {
                (Level::Info, "Provisioning has not finished".to_string())
            }
        };
        lines.push(self.line(level, &summary));

        lines.join("\n")
    }
}

/// Renders a run report without colors.
pub fn report(state: &RunState) -> String {
    Reporter::plain().report(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RunState {
        let mut state = RunState::new(vec![
            "Platform check".to_string(),
            "Git check".to_string(),
            "Dependency environment".to_string(),
            "Helper script".to_string(),
        ]);
        state.begin(0);
        state.record(StepRecord::new("Platform check", Outcome::Succeeded));
        state.begin(1);
        state.record(StepRecord::new(
            "Git check",
            Outcome::Skipped("git version 2.39.3".into()),
        ));
        state.begin(2);
        state.record(
            StepRecord::new("Dependency environment", Outcome::Warned("exit code 1".into()))
                .with_item("star"),
        );
        state
    }

    #[test]
    fn test_plain_line() {
        let reporter = Reporter::plain();
        assert_eq!(reporter.line(Level::Info, "hello"), "[INFO] hello");
        assert_eq!(reporter.line(Level::Error, "bad"), "[ERROR] bad");
    }

    #[test]
    fn test_colored_line_keeps_label() {
        colored::control::set_override(true);
        let line = Reporter::new(true).line(Level::Success, "done");
        assert!(line.contains("[SUCCESS]"));
        assert!(line.ends_with(" done"));
    }

    #[test]
    fn test_level_from_outcome() {
        assert_eq!(Level::from(&Outcome::Pending), Level::Info);
        assert_eq!(Level::from(&Outcome::Skipped(String::new())), Level::Info);
        assert_eq!(Level::from(&Outcome::Succeeded), Level::Success);
        assert_eq!(Level::from(&Outcome::Warned(String::new())), Level::Warning);
        assert_eq!(Level::from(&Outcome::Failed(String::new())), Level::Error);
    }

    #[test]
    fn test_report_completed_with_warnings() {
        let mut state = sample_state();
        state.begin(3);
        state.record(StepRecord::new("Helper script", Outcome::Succeeded));
        state.complete();

        let text = report(&state);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "[SUCCESS] Platform check: succeeded");
        assert_eq!(lines[2], "[INFO] Git check: skipped (git version 2.39.3)");
        assert_eq!(
            lines[3],
            "[WARNING] Dependency environment: star: warned (exit code 1)"
        );
        assert!(text.contains("2 succeeded, 1 skipped, 1 warned, 0 failed, 0 pending"));
        assert!(lines
            .last()
            .unwrap()
            .starts_with("[WARNING] Provisioning completed with 1 warning(s)"));
    }

    #[test]
    fn test_report_aborted_lists_pending() {
        let mut state = RunState::new(vec!["Source".to_string(), "Conda".to_string()]);
        state.start();
        state.begin(0);
        state.record(StepRecord::new("Source", Outcome::Failed("clone failed".into())));

        let text = report(&state);
        assert!(text.starts_with("Provisioning report (started "));
        assert!(text.contains("[ERROR] Source: failed (clone failed)"));
        assert!(text.contains("[INFO] Conda: pending"));
        assert!(text.contains("0 succeeded, 0 skipped, 0 warned, 1 failed, 1 pending"));
        assert!(text.contains("[ERROR] Provisioning aborted at 'Source'"));
    }

    #[test]
    fn test_report_voluntary_exit() {
        let mut state = RunState::new(vec!["Platform check".to_string()]);
        state.begin(0);
        state.voluntary_exit("architecture mismatch declined");

        let text = report(&state);
        assert!(text.ends_with("[INFO] Provisioning stopped: architecture mismatch declined"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let state = sample_state();
        assert_eq!(report(&state), report(&state));
    }
}
