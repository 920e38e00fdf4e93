//! Verification: run one representative tool inside the new environment.

use crate::environment::conda;
use crate::error::Result;
use crate::provision::{Action, Context, Precondition, Severity, Step};

pub struct Verification;

impl Step for Verification {
    fn name(&self) -> &str {
        "Verification"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn mutates(&self) -> bool {
        false
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        if ctx.changed() {
            Ok(Precondition::Unsatisfied)
        } else {
            Ok(Precondition::Satisfied(
                "nothing was installed in this run".to_string(),
            ))
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let env = &ctx.config.environment;
        let conda = conda::conda_binary(&ctx.conda_prefix(), ctx.search_path());
        let command = conda::version_in_env_command(&conda, &env.name, &env.verify_tool);
        let tool = env.verify_tool.clone();

        let output = ctx.capture(command.clone())?;
        if output.status.success() {
            let version = output
                .stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("(no version output)");
            ctx.reporter.success(&format!("{} {}", tool, version));
        } else if !output.stderr.trim().is_empty() {
            log::debug!("{} stderr:\n{}", tool, output.stderr);
        }

        Ok(Action::ran(&command, output.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::{Orchestrator, Outcome, RunState};
    use crate::testing::{test_context, ScriptedRunner};
    use tempfile::tempdir;

    fn run(mut ctx: Context, changed: bool) -> RunState {
        if changed {
            ctx.mark_changed();
        }
        Orchestrator::new(ctx).run(&[Box::new(Verification) as Box<dyn Step>])
    }

    #[test]
    fn test_unchanged_run_skips_verification() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let calls = runner.call_log();

        let state = run(test_context(dir.path()).with_runner(runner), false);

        assert!(matches!(state.outcome_of("Verification"), Outcome::Skipped(_)));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_verification_success() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new().with_stdout("conda", "8.4.2\n");
        let calls = runner.call_log();

        let state = run(test_context(dir.path()).with_runner(runner), true);

        assert_eq!(state.outcome_of("Verification"), Outcome::Succeeded);
        assert_eq!(
            calls.borrow()[0].args,
            vec!["run", "-n", "rnaseq", "snakemake", "--version"]
        );
    }

    #[test]
    fn test_verification_failure_only_warns() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new().with_status("conda", 127);

        let state = run(test_context(dir.path()).with_runner(runner), true);

        match state.outcome_of("Verification") {
            Outcome::Warned(reason) => assert!(reason.contains("exit code 127")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(state.exit_code(), 0);
    }
}
