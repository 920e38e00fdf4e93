//! Run State
//!
//! In-memory record of a provisioning run. Nothing here is persisted: the
//! durable result of a run is the filesystem state the steps leave behind.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Result of one step, or of one item of a step that installs a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    /// Precondition already held, or the user chose to keep what exists.
    Skipped(String),
    Succeeded,
    /// Failed, but the run continues.
    Warned(String),
    /// Failed and halted the run.
    Failed(String),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Skipped(_) => "skipped",
            Self::Succeeded => "succeeded",
            Self::Warned(_) => "warned",
            Self::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Skipped(reason) | Self::Warned(reason) | Self::Failed(reason) => Some(reason),
            Self::Pending | Self::Succeeded => None,
        }
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: String,
    /// Set for per-item outcomes, e.g. a single package.
    pub item: Option<String>,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl StepRecord {
    pub fn new(step: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            step: step.into(),
            item: None,
            outcome,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// `step` or `step: item`.
    pub fn label(&self) -> String {
        match self.item {
            Some(ref item) => format!("{}: {}", self.step, item),
            None => self.step.clone(),
        }
    }
}

/// Where the run is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running(usize),
    /// Every step ran; warnings do not matter here.
    Completed,
    /// A Critical step failed.
    Aborted,
    /// The user declined to continue. Not a failure.
    VoluntaryExit(String),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::VoluntaryExit(_))
    }
}

/// Counts of outcomes by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub skipped: usize,
    pub warned: usize,
    pub failed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    planned: Vec<String>,
    records: Vec<StepRecord>,
    started_steps: usize,
    abort: bool,
    phase: Phase,
    started_at: Option<DateTime<Local>>,
    finished_at: Option<DateTime<Local>>,
}

impl RunState {
    /// Creates the state for a run of the named steps, in order.
    pub fn new(planned: Vec<String>) -> Self {
        Self {
            planned,
            records: Vec::new(),
            started_steps: 0,
            abort: false,
            phase: Phase::NotStarted,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Local::now());
    }

    /// Moves to `Running(index)`. Ignored once the run is terminal.
    pub fn begin(&mut self, index: usize) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = Phase::Running(index);
        self.started_steps = self.started_steps.max(index + 1);
    }

    /// Appends an outcome. A `Failed` outcome aborts the run.
    pub fn record(&mut self, record: StepRecord) {
        let failed = matches!(record.outcome, Outcome::Failed(_));
        self.records.push(record);
        if failed {
            self.abort = true;
            self.finish(Phase::Aborted);
        }
    }

    pub fn voluntary_exit(&mut self, reason: impl Into<String>) {
        self.finish(Phase::VoluntaryExit(reason.into()));
    }

    /// Marks the run completed unless it already ended.
    pub fn complete(&mut self) {
        if !self.phase.is_terminal() {
            self.finish(Phase::Completed);
        }
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.finished_at = Some(Local::now());
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Index of the step currently running.
    pub fn current(&self) -> Option<usize> {
        match self.phase {
            Phase::Running(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    /// Steps that never started.
    pub fn pending_steps(&self) -> &[String] {
        &self.planned[self.started_steps.min(self.planned.len())..]
    }

    /// All outcomes recorded for a step (several for per-item steps).
    pub fn outcomes_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a Outcome> + 'a {
        self.records
            .iter()
            .filter(move |record| record.step == step)
            .map(|record| &record.outcome)
    }

    /// The outcome of a single-record step, `Pending` if it never ran.
    pub fn outcome_of(&self, step: &str) -> Outcome {
        self.outcomes_for(step)
            .last()
            .cloned()
            .unwrap_or(Outcome::Pending)
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally {
            pending: self.pending_steps().len(),
            ..Tally::default()
        };
        for record in &self.records {
            match record.outcome {
                Outcome::Pending => tally.pending += 1,
                Outcome::Skipped(_) => tally.skipped += 1,
                Outcome::Succeeded => tally.succeeded += 1,
                Outcome::Warned(_) => tally.warned += 1,
                Outcome::Failed(_) => tally.failed += 1,
            }
        }
        tally
    }

    /// Process exit code: 1 when aborted, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.abort {
            1
        } else {
            0
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    /// Wall-clock duration of a finished run.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_new_state_is_not_started() {
        let state = RunState::new(planned(&["a", "b"]));
        assert_eq!(state.phase(), &Phase::NotStarted);
        assert_eq!(state.pending_steps(), ["a", "b"]);
        assert_eq!(state.current(), None);
        assert_eq!(state.exit_code(), 0);
    }

    #[test]
    fn test_failed_record_aborts() {
        let mut state = RunState::new(planned(&["a", "b", "c"]));
        state.start();
        state.begin(0);
        state.record(StepRecord::new("a", Outcome::Succeeded));
        state.begin(1);
        assert_eq!(state.current(), Some(1));
        state.record(StepRecord::new("b", Outcome::Failed("boom".into())));

        assert!(state.is_aborted());
        assert_eq!(state.phase(), &Phase::Aborted);
        assert_eq!(state.exit_code(), 1);
        assert_eq!(state.pending_steps(), ["c"]);
        assert!(state.elapsed().is_some());

        // Terminal phases are sticky
        state.begin(2);
        state.complete();
        assert_eq!(state.phase(), &Phase::Aborted);
    }

    #[test]
    fn test_warnings_complete_with_zero_exit() {
        let mut state = RunState::new(planned(&["a"]));
        state.begin(0);
        state.record(StepRecord::new("a", Outcome::Warned("meh".into())));
        state.complete();

        assert_eq!(state.phase(), &Phase::Completed);
        assert_eq!(state.exit_code(), 0);
        assert!(state.pending_steps().is_empty());
    }

    #[test]
    fn test_voluntary_exit_is_zero() {
        let mut state = RunState::new(planned(&["a", "b"]));
        state.begin(0);
        state.record(StepRecord::new("a", Outcome::Skipped("declined".into())));
        state.voluntary_exit("declined");

        assert_eq!(state.phase(), &Phase::VoluntaryExit("declined".into()));
        assert!(!state.is_aborted());
        assert_eq!(state.exit_code(), 0);
    }

    #[test]
    fn test_tally_and_item_outcomes() {
        let mut state = RunState::new(planned(&["deps", "verify"]));
        state.begin(0);
        state.record(StepRecord::new("deps", Outcome::Succeeded).with_item("samtools"));
        state.record(StepRecord::new("deps", Outcome::Warned("x".into())).with_item("star"));

        let tally = state.tally();
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.warned, 1);
        assert_eq!(tally.pending, 1);
        assert_eq!(state.outcomes_for("deps").count(), 2);
        assert_eq!(state.outcome_of("verify"), Outcome::Pending);
    }

    #[test]
    fn test_record_label() {
        let plain = StepRecord::new("Git check", Outcome::Succeeded);
        let item = StepRecord::new("Dependencies", Outcome::Succeeded).with_item("bwa");
        assert_eq!(plain.label(), "Git check");
        assert_eq!(item.label(), "Dependencies: bwa");
    }

    #[test]
    fn test_outcome_kind_and_reason() {
        assert_eq!(Outcome::Pending.kind(), "pending");
        assert_eq!(Outcome::Skipped("s".into()).reason(), Some("s"));
        assert_eq!(Outcome::Succeeded.reason(), None);
    }
}
