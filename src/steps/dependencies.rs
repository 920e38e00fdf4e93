//! Dependency environment: create the pipeline's conda environment.
//!
//! The environment descriptor shipped with the pipeline is preferred. When
//! it is missing, a bare environment is created and the configured packages
//! are installed one at a time so that one unavailable package does not
//! block the rest.

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};

use crate::environment::conda::{self, EnvironmentDescriptor};
use crate::environment::CommandLine;
use crate::error::{ProvisionError, Result};
use crate::provision::{Action, Context, Outcome, Precondition, Severity, Step};

pub struct DependencyEnvironment;

impl DependencyEnvironment {
    fn create_from_descriptor(ctx: &mut Context, solver: &Path, file: &Path) -> Result<Action> {
        for substitution in ctx.config.environment.substitutions.clone() {
            let sed = CommandLine::new("sed")
                .args(["-i.bak", "-e"])
                .arg(substitution.sed_script())
                .arg(file.display().to_string());
            match ctx.run_checked(sed) {
                Ok(()) => debug!("Applied {}", substitution.sed_script()),
                Err(e) => ctx.reporter.warning(&format!(
                    "Could not apply substitution '{}' -> '{}': {}",
                    substitution.pattern, substitution.replacement, e
                )),
            }
        }

        match EnvironmentDescriptor::load(file) {
            Ok(descriptor) => ctx.reporter.info(&format!(
                "{} lists {} conda and {} pip packages",
                file.display(),
                descriptor.conda_packages().len(),
                descriptor.pip_packages().len()
            )),
            Err(e) => warn!("Could not summarize {}: {}", file.display(), e),
        }

        let env_name = ctx.config.environment.name.clone();
        let command = conda::create_from_file_command(solver, &env_name, file);
        let status = ctx.run(command.clone())?;
        Ok(Action::ran(&command, status))
    }

    fn install_individually(ctx: &mut Context, solver: &Path, file: &Path) -> Result<Action> {
        let env = ctx.config.environment.clone();
        ctx.reporter.warning(&format!(
            "{} not found, installing {} packages one by one",
            file.display(),
            env.packages.len()
        ));

        ctx.run_checked(conda::create_bare_command(
            solver,
            &env.name,
            &env.python,
            &env.channels,
        ))?;

        if env.packages.is_empty() {
            return Ok(Action::Warned(format!(
                "created an empty environment '{}': no packages configured",
                env.name
            )));
        }

        let total = env.packages.len();
        let mut items = Vec::with_capacity(total);

        for (index, package) in env.packages.iter().enumerate() {
            ctx.reporter
                .info(&format!("Installing {} ({}/{})", package, index + 1, total));

            let command = conda::install_package_command(solver, &env.name, &env.channels, package);
            let started = Instant::now();
            let outcome = match ctx.run(command.clone()) {
                Ok(status) if status.success() => Outcome::Succeeded,
                Ok(status) => Outcome::Warned(format!("`{}` exited with {}", command, status)),
                Err(e) => Outcome::Warned(e.to_string()),
            };

            if let Outcome::Warned(ref reason) = outcome {
                warn!("Package '{}' failed: {}", package, reason);
            }
            items.push((package.clone(), outcome, started.elapsed()));
        }

        let failed = items
            .iter()
            .filter(|(_, outcome, _)| !matches!(outcome, Outcome::Succeeded))
            .count();
        info!("Installed {}/{} packages", total - failed, total);

        Ok(Action::Items(items))
    }
}

impl Step for DependencyEnvironment {
    fn name(&self) -> &str {
        "Dependency environment"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let conda = conda::conda_binary(&ctx.conda_prefix(), ctx.search_path());
        let listing = conda::env_list_command(&conda);
        let display = listing.to_string();

        let output = ctx.capture(listing)?;
        if !output.status.success() {
            return Err(ProvisionError::CommandFailed {
                command: display,
                status: output.status.to_string(),
            });
        }

        let name = &ctx.config.environment.name;
        if conda::parse_env_names(&output.stdout).contains(name) {
            Ok(Precondition::Satisfied(format!("environment '{}' already exists", name)))
        } else {
            Ok(Precondition::Unsatisfied)
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let solver = conda::solver_binary(&ctx.conda_prefix(), ctx.search_path());
        let file = ctx.env_file_path();
        info!("Using {} to create the environment", solver.display());

        if file.is_file() {
            Self::create_from_descriptor(ctx, &solver, &file)
        } else {
            Self::install_individually(ctx, &solver, &file)
        }
    }
}
