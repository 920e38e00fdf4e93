//! Environment Module
//!
//! Everything that touches the host: running external commands, probing
//! for installed tools, detecting the platform and building conda/mamba
//! invocations.

pub mod command;
pub mod conda;
pub mod platform;
pub mod probe;

pub use command::{CapturedOutput, CommandLine, CommandRunner, CommandStatus, SystemRunner};
pub use conda::EnvironmentDescriptor;
pub use platform::{Platform, HOST_PLATFORM};
pub use probe::{probe, EnvironmentProbe};
