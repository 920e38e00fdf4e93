//! Executable Probing
//!
//! Answers "is this tool installed?" without changing anything on the
//! system.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::debug;

use super::command::{CommandLine, CommandRunner};

/// Result of looking up a named executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentProbe {
    /// Found on the search path. `version` is empty when `--version` gave
    /// nothing usable.
    Present { path: PathBuf, version: String },
    Absent,
}

impl EnvironmentProbe {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Present { version, .. } if !version.is_empty() => Some(version),
            _ => None,
        }
    }

    /// Short human description, e.g. `git version 2.39.3 (/usr/bin/git)`.
    pub fn describe(&self, name: &str) -> String {
        match self {
            Self::Present { path, version } if version.is_empty() => {
                format!("{} ({})", name, path.display())
            }
            Self::Present { path, version } => format!("{} ({})", version, path.display()),
            Self::Absent => format!("{} not found", name),
        }
    }
}

/// Looks up `name` on `search_path` and asks it for its version.
pub fn probe(
    name: &str,
    search_path: Option<&OsStr>,
    runner: &mut dyn CommandRunner,
) -> EnvironmentProbe {
    let Some(path) = resolve_executable(name, search_path) else {
        debug!("Probe: '{}' not found", name);
        return EnvironmentProbe::Absent;
    };

    let version = read_version(&path, search_path, runner);
    debug!("Probe: '{}' -> {} [{}]", name, path.display(), version);

    EnvironmentProbe::Present { path, version }
}

/// Resolves an executable the way a shell would. Names containing a path
/// separator are checked directly.
pub fn resolve_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let search_path = search_path?;
    env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|path| is_executable(path))
}

/// Best-effort `--version` call; any failure yields an empty string.
fn read_version(
    path: &Path,
    search_path: Option<&OsStr>,
    runner: &mut dyn CommandRunner,
) -> String {
    let mut command = CommandLine::new(path).arg("--version");
    command.search_path = search_path.map(OsStr::to_os_string);

    match runner.capture(&command) {
        Ok(output) => first_line(&output.stdout)
            .or_else(|| first_line(&output.stderr))
            .unwrap_or_default(),
        Err(e) => {
            debug!("Could not read version of {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedRunner, write_executable};
    use std::ffi::OsString;
    use tempfile::tempdir;

    fn path_of(dirs: &[&Path]) -> OsString {
        env::join_paths(dirs).unwrap()
    }

    #[test]
    fn test_probe_absent() {
        let dir = tempdir().unwrap();
        let search = path_of(&[dir.path()]);
        let mut runner = ScriptedRunner::new();

        let probe = probe("git", Some(&search), &mut runner);
        assert_eq!(probe, EnvironmentProbe::Absent);
        assert!(runner.calls().is_empty(), "absent tools are never executed");
    }

    #[test]
    fn test_probe_present_with_version() {
        let dir = tempdir().unwrap();
        let git = write_executable(dir.path(), "git");
        let search = path_of(&[dir.path()]);
        let mut runner = ScriptedRunner::new().with_stdout("git", "\ngit version 2.39.3\nextra\n");

        let probe = probe("git", Some(&search), &mut runner);
        assert_eq!(
            probe,
            EnvironmentProbe::Present {
                path: git,
                version: "git version 2.39.3".to_string()
            }
        );
    }

    #[test]
    fn test_probe_version_failure_is_still_present() {
        let dir = tempdir().unwrap();
        write_executable(dir.path(), "mamba");
        let search = path_of(&[dir.path()]);
        let mut runner = ScriptedRunner::new().with_spawn_error("mamba");

        let probe = probe("mamba", Some(&search), &mut runner);
        assert!(probe.is_present());
        assert_eq!(probe.version(), None);
    }

    #[test]
    fn test_probe_version_from_stderr() {
        let dir = tempdir().unwrap();
        write_executable(dir.path(), "java");
        let search = path_of(&[dir.path()]);
        let mut runner = ScriptedRunner::new().with_stderr("java", "openjdk 17.0.2\n");

        let probe = probe("java", Some(&search), &mut runner);
        assert_eq!(probe.version(), Some("openjdk 17.0.2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_skips_non_executable() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("git"), "not executable").unwrap();
        let search = path_of(&[dir.path()]);

        assert_eq!(resolve_executable("git", Some(&search)), None);
    }

    #[test]
    fn test_resolve_uses_first_match() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let expected = write_executable(first.path(), "curl");
        write_executable(second.path(), "curl");
        let search = path_of(&[first.path(), second.path()]);

        assert_eq!(resolve_executable("curl", Some(&search)), Some(expected));
    }

    #[test]
    fn test_resolve_direct_path() {
        let dir = tempdir().unwrap();
        let tool = write_executable(dir.path(), "conda");

        assert_eq!(
            resolve_executable(tool.to_str().unwrap(), None),
            Some(tool.clone())
        );
        assert_eq!(resolve_executable("conda", None), None);
        assert_eq!(resolve_executable("", None), None);
    }

    #[test]
    fn test_describe() {
        let present = EnvironmentProbe::Present {
            path: PathBuf::from("/usr/bin/git"),
            version: "git version 2.39.3".to_string(),
        };
        let bare = EnvironmentProbe::Present {
            path: PathBuf::from("/usr/bin/git"),
            version: String::new(),
        };

        assert_eq!(present.describe("git"), "git version 2.39.3 (/usr/bin/git)");
        assert_eq!(bare.describe("git"), "git (/usr/bin/git)");
        assert_eq!(EnvironmentProbe::Absent.describe("git"), "git not found");
    }
}
