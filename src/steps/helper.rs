//! Helper script: a small `source`-able script that activates the
//! environment and enters the pipeline checkout.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::environment::probe::is_executable;
use crate::error::Result;
use crate::provision::{Action, Context, Precondition, Severity, Step};

pub struct HelperScript;

impl HelperScript {
    /// Script text for the current configuration.
    pub fn render(ctx: &Context) -> String {
        let prefix = ctx.conda_prefix();
        let env_name = &ctx.config.environment.name;
        let script = ctx.helper_script_path();

        format!(
            "#!/bin/bash\n\
             # Activates the '{env}' environment for {pipeline}.\n\
             # Usage: source {script}\n\
             source \"{conda_sh}\"\n\
             conda activate {env}\n\
             cd \"{target}\"\n",
            env = env_name,
            pipeline = ctx.config.pipeline.name,
            script = script.display(),
            conda_sh = prefix.join("etc/profile.d/conda.sh").display(),
            target = ctx.target_dir().display(),
        )
    }

    fn write_script(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(())
    }
}

impl Step for HelperScript {
    fn name(&self) -> &str {
        "Helper script"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn mutates(&self) -> bool {
        false
    }

    /// Up to date means the exact rendered text and an executable mode.
    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let path = ctx.helper_script_path();
        match fs::read_to_string(&path) {
            Ok(existing) if existing == Self::render(ctx) && is_executable(&path) => {
                Ok(Precondition::Satisfied(format!(
                    "{} is up to date",
                    path.display()
                )))
            }
            _ => Ok(Precondition::Unsatisfied),
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let path = ctx.helper_script_path();
        Self::write_script(&path, &Self::render(ctx))?;

        ctx.reporter
            .info(&format!("Activate the environment with: source {}", path.display()));
        Ok(Action::Succeeded)
    }
}
