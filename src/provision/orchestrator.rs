//! Provisioning Orchestrator
//!
//! Runs steps strictly in order:
//! - precondition holds → skipped
//! - action succeeds → succeeded
//! - action fails → failed and abort (Critical) or warned and continue
//!   (Warning)
//!
//! A user-declined continuation ends the run early without failing it.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::context::Context;
use super::state::{Outcome, Phase, RunState, StepRecord};
use super::step::{Action, Precondition, Severity, Step};

/// How a step ended, before it is written into the run state.
enum Resolution {
    Single(Outcome),
    Items(Vec<(String, Outcome, Duration)>),
    Exit(String),
}

/// Drives a sequence of steps against one [`Context`].
///
/// # Example
///
/// ```rust,no_run
/// use bioprovision::config::ProvisionConfig;
/// use bioprovision::provision::{Context, Orchestrator};
/// use bioprovision::steps::standard_steps;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let ctx = Context::from_process(ProvisionConfig::builtin()?)?;
///     let mut orchestrator = Orchestrator::new(ctx);
///     let state = orchestrator.run(&standard_steps());
///     std::process::exit(state.exit_code().into());
/// }
/// ```
pub struct Orchestrator {
    context: Context,
}

impl Orchestrator {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    /// Executes `steps` in order and returns the accumulated state.
    pub fn run(&mut self, steps: &[Box<dyn Step>]) -> RunState {
        let mut state = RunState::new(steps.iter().map(|step| step.name().to_string()).collect());
        state.start();

        let total = steps.len();
        info!("Starting provisioning ({} steps)", total);

        for (index, step) in steps.iter().enumerate() {
            state.begin(index);
            self.context
                .reporter
                .info(&format!("[{}/{}] {}", index + 1, total, step.name()));

            let started = Instant::now();
            let resolution = self.execute(step.as_ref());
            let elapsed = started.elapsed();

            match resolution {
                Resolution::Single(outcome) => {
                    self.record(
                        &mut state,
                        StepRecord::new(step.name(), outcome).with_elapsed(elapsed),
                    );
                }
                Resolution::Items(items) => {
                    for (item, outcome, took) in items {
                        self.record(
                            &mut state,
                            StepRecord::new(step.name(), outcome)
                                .with_item(item)
                                .with_elapsed(took),
                        );
                    }
                }
                Resolution::Exit(reason) => {
                    self.record(
                        &mut state,
                        StepRecord::new(step.name(), Outcome::Skipped(reason.clone()))
                            .with_elapsed(elapsed),
                    );
                    info!("Stopping at '{}': {}", step.name(), reason);
                    state.voluntary_exit(reason);
                    break;
                }
            }

            if state.is_aborted() {
                error!("Critical step '{}' failed, aborting", step.name());
                break;
            }
        }

        state.complete();
        if *state.phase() == Phase::Completed {
            info!("Provisioning finished: {:?}", state.tally());
        }
        state
    }

    fn record(&self, state: &mut RunState, record: StepRecord) {
        let line = self.context.reporter.record_line(&record);
        println!("{}", line);
        state.record(record);
    }

    /// Runs one step's precondition and, if needed, its action.
    fn execute(&mut self, step: &dyn Step) -> Resolution {
        let severity = step.severity();

        match step.precondition(&mut self.context) {
            Ok(Precondition::Satisfied(reason)) => {
                debug!("'{}' already satisfied: {}", step.name(), reason);
                return Resolution::Single(Outcome::Skipped(reason));
            }
            Ok(Precondition::Unsatisfied) => {}
            Err(e) => {
                warn!("Precondition of '{}' could not be checked: {}", step.name(), e);
                return Resolution::Single(settle_failure(severity, e.to_string()));
            }
        }

        let action = match step.action(&mut self.context) {
            Ok(action) => action,
            Err(e) => return Resolution::Single(settle_failure(severity, e.to_string())),
        };

        let resolution = match action {
            Action::Ran { command, status } if status.success() => {
                debug!("`{}` succeeded", command);
                Resolution::Single(Outcome::Succeeded)
            }
            Action::Ran { command, status } => Resolution::Single(settle_failure(
                severity,
                format!("`{}` exited with {}", command, status),
            )),
            Action::Succeeded => Resolution::Single(Outcome::Succeeded),
            Action::Warned(reason) => Resolution::Single(Outcome::Warned(reason)),
            Action::Declined(reason) => Resolution::Single(Outcome::Skipped(reason)),
            Action::Exit(reason) => Resolution::Exit(reason),
            Action::Items(items) => Resolution::Items(items),
        };

        if step.mutates() && changed_system(&resolution) {
            self.context.mark_changed();
        }

        resolution
    }
}

/// Maps a failure onto an outcome according to the step's severity.
fn settle_failure(severity: Severity, reason: String) -> Outcome {
    match severity {
        Severity::Critical => Outcome::Failed(reason),
        Severity::Warning => Outcome::Warned(reason),
    }
}

fn changed_system(resolution: &Resolution) -> bool {
    match resolution {
        Resolution::Single(outcome) => matches!(outcome, Outcome::Succeeded | Outcome::Warned(_)),
        Resolution::Items(items) => items
            .iter()
            .any(|(_, outcome, _)| matches!(outcome, Outcome::Succeeded)),
        Resolution::Exit(_) => false,
    }
}

/// Prints the final report through the context's reporter.
pub fn print_report(context: &Context, state: &RunState) {
    println!();
    println!("{}", context.reporter.report(state));
    if state.is_aborted() {
        context
            .reporter
            .error("A critical step failed; fix the error above and run again.");
    }
}
