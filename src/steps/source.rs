//! Source acquisition: clone the pipeline repository.

use std::fs;

use log::{debug, info};

use crate::environment::CommandLine;
use crate::error::{ProvisionError, Result};
use crate::provision::{Action, Context, Precondition, Severity, Step};

pub struct SourceAcquisition;

impl SourceAcquisition {
    fn clone_command(ctx: &Context) -> CommandLine {
        let pipeline = &ctx.config.pipeline;
        let mut command = CommandLine::new("git").arg("clone");
        if let Some(ref branch) = pipeline.branch {
            command = command.args(["--branch", branch.as_str()]);
        }
        command
            .arg(pipeline.repository.as_str())
            .arg(ctx.target_dir().display().to_string())
            .interactive()
    }
}

impl Step for SourceAcquisition {
    fn name(&self) -> &str {
        "Source acquisition"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    /// An existing checkout is kept unless the user asks for a fresh clone.
    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let target = ctx.target_dir();
        if !target.exists() {
            return Ok(Precondition::Unsatisfied);
        }

        ctx.reporter
            .warning(&format!("Directory {} already exists", target.display()));
        let question = format!("Remove {} and clone a fresh copy?", target.display());

        if ctx.confirm_destructive(&question) {
            Ok(Precondition::Unsatisfied)
        } else {
            Ok(Precondition::Satisfied(format!(
                "keeping existing checkout at {}",
                target.display()
            )))
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let target = ctx.target_dir();

        if target.exists() {
            info!("Removing {}", target.display());
            fs::remove_dir_all(&target)?;
        }
        fs::create_dir_all(&target)?;

        let command = Self::clone_command(ctx);
        ctx.reporter.info(&format!(
            "Cloning {} into {}",
            ctx.config.pipeline.repository,
            target.display()
        ));

        let status = ctx.run(command.clone())?;
        if !status.success() {
            // Leave no empty directory behind for the next run to ask about
            if let Err(e) = fs::remove_dir(&target) {
                debug!("Left {} in place: {}", target.display(), e);
            }
            return Ok(Action::ran(&command, status));
        }

        let populated = fs::read_dir(&target)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if !populated {
            return Err(ProvisionError::Verification(format!(
                "git clone reported success but {} is empty",
                target.display()
            )));
        }

        Ok(Action::ran(&command, status))
    }
}
