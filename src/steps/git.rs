//! Git check: the clone step needs a working `git`.

use log::{debug, info};

use crate::environment::probe::resolve_executable;
use crate::environment::{CommandLine, Platform};
use crate::error::{ProvisionError, Result};
use crate::provision::{Action, Context, Precondition, Severity, Step};

/// System package managers tried in order, with the command that installs
/// git through each.
const PACKAGE_MANAGERS: &[(&str, &[&str])] = &[
    ("brew", &["brew", "install", "git"]),
    ("apt-get", &["sudo", "apt-get", "install", "-y", "git"]),
    ("dnf", &["sudo", "dnf", "install", "-y", "git"]),
    ("pacman", &["sudo", "pacman", "-S", "--noconfirm", "git"]),
];

pub struct GitCheck;

impl Step for GitCheck {
    fn name(&self) -> &str {
        "Git check"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let probe = ctx.probe("git");
        if probe.is_present() {
            Ok(Precondition::Satisfied(probe.describe("git")))
        } else {
            Ok(Precondition::Unsatisfied)
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let Some((manager, argv)) = PACKAGE_MANAGERS
            .iter()
            .find(|(manager, _)| resolve_executable(manager, ctx.search_path()).is_some())
        else {
            return Err(ProvisionError::MissingTool {
                tool: "git".to_string(),
                guidance: install_guidance(&ctx.platform),
            });
        };

        info!("Installing git with {}", manager);
        ctx.reporter
            .info(&format!("git not found, installing it with {}", manager));

        let command = CommandLine::new(argv[0]).args(argv[1..].iter().copied()).interactive();
        let status = ctx.run(command.clone())?;
        if !status.success() {
            return Ok(Action::ran(&command, status));
        }

        let probe = ctx.probe("git");
        debug!("After install: {}", probe.describe("git"));
        if !probe.is_present() {
            return Err(ProvisionError::Verification(format!(
                "{} reported success but git is still not on the search path",
                manager
            )));
        }

        Ok(Action::ran(&command, status))
    }
}

fn install_guidance(platform: &Platform) -> String {
    if platform.is_macos() {
        "Install the Xcode Command Line Tools (`xcode-select --install`) or Homebrew \
         (https://brew.sh), then run again."
            .to_string()
    } else {
        "Install git with your system package manager, then run again.".to_string()
    }
}
