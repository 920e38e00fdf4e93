//! Provisioning Core
//!
//! The step model, the explicit run context, the run state and the
//! orchestrator that ties them together.
//!
//! - [`step`]: `Step` trait, severities and action results
//! - [`context`]: configuration, host facts and I/O collaborators
//! - [`state`]: per-run outcome log and lifecycle phase
//! - [`orchestrator`]: ordered, fail-tolerant execution

pub mod context;
pub mod orchestrator;
pub mod state;
pub mod step;

pub use context::Context;
pub use orchestrator::{print_report, Orchestrator};
pub use state::{Outcome, Phase, RunState, StepRecord, Tally};
pub use step::{Action, FnStep, Precondition, Severity, Step};
