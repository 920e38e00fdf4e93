//! Conda bootstrap: install Miniforge when no conda distribution exists at
//! the configured prefix.

use std::fs;

use log::{info, warn};

use crate::environment::conda;
use crate::environment::CommandLine;
use crate::error::{ProvisionError, Result};
use crate::provision::{Action, Context, Precondition, Severity, Step};

pub struct CondaBootstrap;

impl Step for CondaBootstrap {
    fn name(&self) -> &str {
        "Conda bootstrap"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let prefix = ctx.conda_prefix();
        if !conda::is_installed(&prefix) {
            return Ok(Precondition::Unsatisfied);
        }

        ctx.prepend_search_path(&prefix.join("bin"));
        Ok(Precondition::Satisfied(format!(
            "conda found at {}",
            conda::conda_executable(&prefix).display()
        )))
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let prefix = ctx.conda_prefix();
        let installer = conda::installer_name(&ctx.platform).ok_or_else(|| {
            ProvisionError::UnsupportedPlatform {
                expected: "a platform with a Miniforge build".to_string(),
                found: ctx.platform.to_string(),
            }
        })?;
        let url = conda::installer_url(&ctx.config.conda.installer_url, &installer);
        let installer_path = ctx.temp_dir.join(&installer);

        ctx.reporter.info(&format!("Downloading {}", url));
        let download = CommandLine::new("curl")
            .args(["-fL", "--progress-bar", "-o"])
            .arg(installer_path.display().to_string())
            .arg(url)
            .interactive();
        let status = ctx.run(download.clone())?;
        if !status.success() {
            return Ok(Action::ran(&download, status));
        }

        ctx.reporter.info(&format!(
            "Running {} (follow the installer's prompts)",
            installer
        ));
        let mut install = CommandLine::new("bash")
            .arg(installer_path.display().to_string())
            .arg("-p")
            .arg(prefix.display().to_string());
        if prefix.exists() {
            // Partial installation left behind by an earlier attempt
            install = install.arg("-u");
        }
        let install = install.interactive();
        let result = ctx.run(install.clone());

        if let Err(e) = fs::remove_file(&installer_path) {
            warn!("Failed to remove installer {}: {}", installer_path.display(), e);
        }

        let status = result?;
        if !status.success() {
            return Ok(Action::ran(&install, status));
        }

        if !conda::is_installed(&prefix) {
            return Err(ProvisionError::Verification(format!(
                "installer finished but {} is missing",
                conda::conda_executable(&prefix).display()
            )));
        }
        ctx.prepend_search_path(&prefix.join("bin"));
        info!("Conda installed at {}", prefix.display());

        if let Some(shell) = ctx.config.conda.shell.clone() {
            let init = conda::init_shell_command(&conda::conda_executable(&prefix), &shell);
            if let Err(e) = ctx.run_checked(init) {
                return Ok(Action::Warned(format!(
                    "conda installed, but shell initialization failed: {}",
                    e
                )));
            }
        }

        Ok(Action::ran(&install, status))
    }
}
