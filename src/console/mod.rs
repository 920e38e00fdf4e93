//! Console Interaction
//!
//! User-facing input and output: the yes/no prompt and the colored status
//! reporter. Diagnostic logging goes through the `log` facade instead.

pub mod prompt;
pub mod reporter;

pub use prompt::{AssumeYes, Confirm, Prompt};
pub use reporter::{report, Level, Reporter};
