//! Step Library
//!
//! The concrete provisioning steps, in the order they run:
//!
//! 1. [`PlatformCheck`] (critical)
//! 2. [`GitCheck`] (critical)
//! 3. [`SourceAcquisition`] (critical)
//! 4. [`CondaBootstrap`] (critical)
//! 5. [`DependencyEnvironment`] (warning)
//! 6. [`Verification`] (warning)
//! 7. [`HelperScript`] (warning)

pub mod bootstrap;
pub mod dependencies;
pub mod git;
pub mod helper;
pub mod platform;
pub mod source;
pub mod verify;

pub use bootstrap::CondaBootstrap;
pub use dependencies::DependencyEnvironment;
pub use git::GitCheck;
pub use helper::HelperScript;
pub use platform::PlatformCheck;
pub use source::SourceAcquisition;
pub use verify::Verification;

use crate::provision::Step;

/// The full provisioning pipeline.
pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PlatformCheck),
        Box::new(GitCheck),
        Box::new(SourceAcquisition),
        Box::new(CondaBootstrap),
        Box::new(DependencyEnvironment),
        Box::new(Verification),
        Box::new(HelperScript),
    ]
}
