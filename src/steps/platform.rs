//! Platform check: is this the OS and CPU the pipeline is packaged for?

use log::info;

use crate::environment::platform::normalize_arch;
use crate::error::{ProvisionError, Result};
use crate::provision::{Action, Context, Precondition, Severity, Step};

pub struct PlatformCheck;

impl Step for PlatformCheck {
    fn name(&self) -> &str {
        "Platform check"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn mutates(&self) -> bool {
        false
    }

    fn precondition(&self, ctx: &mut Context) -> Result<Precondition> {
        let expected = &ctx.config.platform;
        let host = &ctx.platform;
        info!("Host platform: {} ({})", host, host.description);

        if host.os == expected.os && host.arch == normalize_arch(&expected.arch) {
            Ok(Precondition::Satisfied(format!("{} ({})", host, host.description)))
        } else {
            Ok(Precondition::Unsatisfied)
        }
    }

    fn action(&self, ctx: &mut Context) -> Result<Action> {
        let expected_os = ctx.config.platform.os.clone();
        let expected_arch = normalize_arch(&ctx.config.platform.arch);
        let host = ctx.platform.clone();

        let mut caveats = Vec::new();

        if host.os != expected_os {
            if !ctx.config.platform.allow_other_os {
                return Err(ProvisionError::UnsupportedPlatform {
                    expected: expected_os,
                    found: host.os,
                });
            }
            caveats.push(format!(
                "running on {} instead of {} (allowed by configuration)",
                host.os, expected_os
            ));
        }

        if host.arch != expected_arch {
            ctx.reporter.warning(&format!(
                "This setup targets {} CPUs, but this machine is {}. Some packages may be \
                 missing or run under emulation.",
                expected_arch, host.arch
            ));

            if !ctx.confirm("Continue on this architecture anyway?") {
                return Ok(Action::Exit(format!(
                    "declined to continue on {} (expected {})",
                    host.arch, expected_arch
                )));
            }
            caveats.push(format!(
                "architecture {} differs from expected {}",
                host.arch, expected_arch
            ));
        }

        if caveats.is_empty() {
            Ok(Action::Succeeded)
        } else {
            Ok(Action::Warned(caveats.join("; ")))
        }
    }
}
