//! BioProvision - Pipeline Dependency Provisioner
//!
//! Prepares a workstation to run a Snakemake bioinformatics pipeline: checks
//! the platform, makes sure git is available, fetches the pipeline sources,
//! installs a conda distribution, builds the pipeline's environment and
//! writes a small activation script.
//!
//! Every step first checks whether its work is already done, so running the
//! provisioner twice is safe. Failures of critical steps stop the run; other
//! failures are reported as warnings and the run carries on.
//!
//! # Architecture
//!
//! - [`config`]: YAML configuration with built-in defaults
//! - [`environment`]: external commands, tool probing, platform and conda
//! - [`console`]: confirmation prompt and colored status reporter
//! - [`provision`]: step model, run context, run state and orchestrator
//! - [`steps`]: the concrete provisioning steps
//!
//! # Example
//!
//! ```rust,no_run
//! use bioprovision::config::ProvisionConfig;
//! use bioprovision::provision::{print_report, Context, Orchestrator};
//! use bioprovision::steps::standard_steps;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProvisionConfig::builtin()?;
//!     let mut orchestrator = Orchestrator::new(Context::from_process(config)?);
//!
//!     let state = orchestrator.run(&standard_steps());
//!     print_report(orchestrator.context(), &state);
//!     std::process::exit(state.exit_code().into());
//! }
//! ```

pub mod config;
pub mod console;
pub mod environment;
pub mod error;
pub mod provision;
pub mod steps;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::ProvisionConfig;
pub use error::{ProvisionError, Result};
pub use provision::{Context, Orchestrator, RunState};
pub use steps::standard_steps;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "BioProvision";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "BioProvision");
    }

    #[test]
    fn test_module_exports_config() {
        let config = ProvisionConfig::builtin().unwrap();
        assert_eq!(config.pipeline.name, "rna-seq-star-deseq2");
    }

    #[test]
    fn test_module_exports_steps() {
        assert_eq!(standard_steps().len(), 7);
    }
}
