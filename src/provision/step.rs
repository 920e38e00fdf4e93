//! Installation Step Model
//!
//! A step is a precondition ("is it already there?") plus an action that
//! does the work, tagged with a severity deciding what a failure means.

use std::time::Duration;

use super::context::Context;
use super::state::Outcome;
use crate::environment::{CommandLine, CommandStatus};
use crate::error::Result;

/// What a failure of the step does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Failure halts the run.
    Critical,
    /// Failure is reported and the run continues.
    Warning,
}

/// Result of a step's idempotency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Nothing to do; the message says why.
    Satisfied(String),
    Unsatisfied,
}

/// What an action reports back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// One external command ran; its exit status decides the outcome.
    Ran { command: String, status: CommandStatus },
    /// Work done without an external command.
    Succeeded,
    /// Work done, with a caveat worth reporting.
    Warned(String),
    /// The user chose to keep the current state.
    Declined(String),
    /// The user chose to stop the whole run. Not a failure.
    Exit(String),
    /// Independently settled items, e.g. one per package, each with the
    /// time it took.
    Items(Vec<(String, Outcome, Duration)>),
}

impl Action {
    pub fn ran(command: &CommandLine, status: CommandStatus) -> Self {
        Self::Ran {
            command: command.to_string(),
            status,
        }
    }
}

/// A single provisioning step.
pub trait Step {
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Whether a successful action changes the provisioned system. Only
    /// such steps invalidate a previous verification.
    fn mutates(&self) -> bool {
        true
    }

    /// Checks whether the step's work is already done.
    fn precondition(&self, ctx: &mut Context) -> Result<Precondition>;

    /// Performs the work. Errors are settled like a non-zero exit status.
    fn action(&self, ctx: &mut Context) -> Result<Action>;
}

type CheckFn = Box<dyn Fn(&mut Context) -> bool>;
type ActionFn = Box<dyn Fn(&mut Context) -> CommandStatus>;

/// A step assembled from closures: `(name, precondition, action, severity)`.
pub struct FnStep {
    name: String,
    severity: Severity,
    precondition: CheckFn,
    action: ActionFn,
}

impl FnStep {
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        precondition: impl Fn(&mut Context) -> bool + 'static,
        action: impl Fn(&mut Context) -> CommandStatus + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            precondition: Box::new(precondition),
            action: Box::new(action),
        }
    }
}

impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        Ok(if (self.precondition)(ctx) {
            Precondition::Satisfied("already done".to_string())
        } else {
            Precondition::Unsatisfied
        })
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let status = (self.action)(ctx);
        Ok(Action::Ran {
            command: self.name.clone(),
            status,
        })
    }
}
