//! Conda/Mamba Integration
//!
//! Command builders and parsers for the Miniforge distribution. Nothing in
//! here runs a process; steps hand the built [`CommandLine`]s to the
//! context's runner.
//!
//! # Binary Resolution Priority
//!
//! 1. `{prefix}/bin/mamba`
//! 2. `{prefix}/bin/conda`
//! 3. `mamba`, then `conda`, on the search path

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use super::command::CommandLine;
use super::platform::Platform;
use super::probe::resolve_executable;
use crate::error::Result;

/// Placeholder in the configured installer URL.
pub const INSTALLER_PLACEHOLDER: &str = "{installer}";

/// Path of the `conda` entry point inside an installation prefix.
pub fn conda_executable(prefix: &Path) -> PathBuf {
    prefix.join("bin").join("conda")
}

/// True when a conda distribution is installed at `prefix`.
pub fn is_installed(prefix: &Path) -> bool {
    conda_executable(prefix).exists()
}

/// Picks the package solver binary, preferring mamba.
pub fn solver_binary(prefix: &Path, search_path: Option<&OsStr>) -> PathBuf {
    let bin = prefix.join("bin");
    for candidate in [bin.join("mamba"), bin.join("conda")] {
        if candidate.exists() {
            return candidate;
        }
    }

    ["mamba", "conda"]
        .iter()
        .find_map(|name| resolve_executable(name, search_path))
        .unwrap_or_else(|| PathBuf::from("conda"))
}

/// Picks the `conda` binary itself (needed for `conda run`/`conda init`).
pub fn conda_binary(prefix: &Path, search_path: Option<&OsStr>) -> PathBuf {
    let local = conda_executable(prefix);
    if local.exists() {
        return local;
    }
    resolve_executable("conda", search_path).unwrap_or_else(|| PathBuf::from("conda"))
}

/// Miniforge installer file name for a platform, e.g.
/// `Miniforge3-MacOSX-arm64.sh`. `None` when Miniforge has no build.
pub fn installer_name(platform: &Platform) -> Option<String> {
    let os = match platform.os.as_str() {
        "macos" => "MacOSX",
        "linux" => "Linux",
        _ => return None,
    };

    let arch = match (platform.os.as_str(), platform.arch.as_str()) {
        ("macos", "aarch64") => "arm64",
        (_, "aarch64") => "aarch64",
        (_, "x86_64") => "x86_64",
        ("linux", "ppc64le") => "ppc64le",
        _ => return None,
    };

    Some(format!("Miniforge3-{}-{}.sh", os, arch))
}

/// Fills the installer name into the configured URL template.
pub fn installer_url(template: &str, installer: &str) -> String {
    template.replace(INSTALLER_PLACEHOLDER, installer)
}

pub fn env_list_command(conda: &Path) -> CommandLine {
    CommandLine::new(conda).args(["env", "list"])
}

/// Extracts environment names from `conda env list` output.
///
/// Unnamed environments (listed only by path) are ignored.
pub fn parse_env_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| !name.starts_with('/'))
        .map(str::to_string)
        .collect()
}

pub fn create_from_file_command(solver: &Path, env_name: &str, file: &Path) -> CommandLine {
    CommandLine::new(solver)
        .args(["env", "create", "-n", env_name, "-f"])
        .arg(file.display().to_string())
        .interactive()
}

pub fn create_bare_command(
    solver: &Path,
    env_name: &str,
    python: &str,
    channels: &[String],
) -> CommandLine {
    CommandLine::new(solver)
        .args(["create", "-y", "-n", env_name])
        .args(channel_args(channels))
        .arg(format!("python={}", python))
        .interactive()
}

pub fn install_package_command(
    solver: &Path,
    env_name: &str,
    channels: &[String],
    package: &str,
) -> CommandLine {
    CommandLine::new(solver)
        .args(["install", "-y", "-n", env_name])
        .args(channel_args(channels))
        .arg(package)
        .interactive()
}

/// `conda run -n <env> <tool> --version`
pub fn version_in_env_command(conda: &Path, env_name: &str, tool: &str) -> CommandLine {
    CommandLine::new(conda)
        .args(["run", "-n", env_name, tool, "--version"])
}

pub fn init_shell_command(conda: &Path, shell: &str) -> CommandLine {
    CommandLine::new(conda).args(["init", shell])
}

fn channel_args(channels: &[String]) -> Vec<String> {
    channels
        .iter()
        .flat_map(|channel| ["-c".to_string(), channel.clone()])
        .collect()
}

/// The subset of a conda `environment.yml` that is reported before
/// installation.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EnvironmentDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A dependency entry: a conda spec or a nested pip list.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Dependency {
    Package(String),
    Pip { pip: Vec<String> },
}

impl EnvironmentDescriptor {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let descriptor: Self = serde_yaml::from_str(&content)?;
        debug!(
            "Descriptor {}: {} conda packages, {} pip packages",
            path.display(),
            descriptor.conda_packages().len(),
            descriptor.pip_packages().len()
        );
        Ok(descriptor)
    }

    pub fn conda_packages(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter_map(|dep| match dep {
                Dependency::Package(spec) => Some(spec.as_str()),
                Dependency::Pip { .. } => None,
            })
            .collect()
    }

    pub fn pip_packages(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .flat_map(|dep| match dep {
                Dependency::Pip { pip } => pip.iter().map(String::as_str).collect(),
                Dependency::Package(_) => Vec::new(),
            })
            .collect()
    }
}
