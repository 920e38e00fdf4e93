//! Provisioning Configuration
//!
//! Settings are layered: the built-in `provision.yaml` compiled into the
//! binary provides every key, and a user file only needs the keys it wants
//! to change.
//!
//! # Resolution Priority
//!
//! 1. A file passed with `--config`
//! 2. `provision.yaml` in the working directory
//! 3. Built-in defaults only

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{ProvisionError, Result};

/// Built-in defaults, shipped next to `Cargo.toml`.
pub const DEFAULT_CONFIG: &str = include_str!("../provision.yaml");

/// File name looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "provision.yaml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProvisionConfig {
    pub pipeline: PipelineConfig,
    pub platform: PlatformConfig,
    pub conda: CondaConfig,
    pub environment: EnvironmentConfig,

    /// Where the activation helper is written (`~` expands to home).
    pub helper_script: String,

    /// Answer every confirmation prompt with "yes".
    pub assume_yes: bool,
}

/// The pipeline whose sources are cloned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub name: String,
    pub repository: String,
    pub branch: Option<String>,
    pub target_dir: String,
}

/// Expected host platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    /// OS family as reported by `std::env::consts::OS` ("macos", "linux").
    pub os: String,
    /// Normalized CPU architecture ("aarch64", "x86_64").
    pub arch: String,
    /// Downgrade an OS family mismatch from a failure to a warning.
    pub allow_other_os: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CondaConfig {
    /// Installation prefix of the Miniforge distribution.
    pub prefix: String,
    /// Download URL; `{installer}` is replaced by the installer file name.
    pub installer_url: String,
    /// Shell passed to `conda init` after a fresh install.
    pub shell: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,
    /// Environment descriptor, relative to the pipeline checkout.
    pub file: String,
    /// Python pinned in the bare environment of the per-package fallback.
    pub python: String,
    pub channels: Vec<String>,
    /// Packages installed one by one when the descriptor is missing.
    pub packages: Vec<String>,
    /// Text substitutions applied to the descriptor before it is used.
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    /// Tool invoked with `--version` to verify the environment.
    pub verify_tool: String,
}

/// A `sed` style replacement applied to the environment descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    /// Renders the substitution as a `sed` script using `|` as delimiter.
    pub fn sed_script(&self) -> String {
        format!(
            "s|{}|{}|g",
            self.pattern.replace('|', "\\|"),
            self.replacement.replace('|', "\\|")
        )
    }
}

impl ProvisionConfig {
    /// Returns the built-in configuration.
    pub fn builtin() -> Result<Self> {
        Ok(serde_yaml::from_str(DEFAULT_CONFIG)?)
    }

    /// Parses a YAML overlay on top of the built-in defaults.
    pub fn from_overlay(yaml: &str) -> Result<Self> {
        let mut base: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let overlay: Value = serde_yaml::from_str(yaml)?;
        merge_values(&mut base, overlay);
        Ok(serde_yaml::from_value(base)?)
    }

    /// Loads the configuration following the resolution priority.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let local = working_dir.join(LOCAL_CONFIG_FILE);
                local.is_file().then_some(local)
            }
        };

        let Some(path) = path else {
            debug!("No config file found, using built-in defaults");
            return Self::builtin();
        };

        let content = fs::read_to_string(&path).map_err(|source| ProvisionError::ConfigRead {
            path: path.clone(),
            source,
        })?;

        info!("Using config: {}", path.display());
        Self::from_overlay(&content)
    }
}

/// Recursively merges `overlay` into `base`. Mappings merge key by key,
/// everything else is replaced. A null document leaves `base` untouched.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                let nested = value.is_mapping() && base_map.get(&key).is_some_and(Value::is_mapping);
                match base_map.get_mut(&key) {
                    Some(existing) if nested => merge_values(existing, value),
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Expands a leading `~` to `home` and resolves relative paths against
/// `working_dir`.
pub fn expand_path(raw: &str, home: &Path, working_dir: &Path) -> PathBuf {
    let expanded = if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if expanded.is_absolute() {
        expanded
    } else {
        working_dir.join(expanded)
    }
}
