//! Host Platform Detection

use std::env::consts;
use std::fmt;

use once_cell::sync::Lazy;
use sysinfo::System;

/// Platform of the running host, detected once per process.
pub static HOST_PLATFORM: Lazy<Platform> = Lazy::new(Platform::detect);

/// Operating system family and CPU architecture of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS family in `std::env::consts::OS` terms ("macos", "linux").
    pub os: String,
    /// Normalized architecture ("aarch64", "x86_64").
    pub arch: String,
    /// Human readable OS release, e.g. "macOS 14.4 Sonoma".
    pub description: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        let os = os.into();
        Self {
            description: os.clone(),
            os,
            arch: normalize_arch(&arch.into()),
        }
    }

    /// Detects the running host.
    ///
    /// The architecture comes from the kernel when available so that a
    /// binary built for another target still reports the real machine.
    pub fn detect() -> Self {
        let arch = System::cpu_arch()
            .map(|arch| normalize_arch(&arch))
            .unwrap_or_else(|| normalize_arch(consts::ARCH));

        let description = System::long_os_version()
            .or_else(System::name)
            .unwrap_or_else(|| consts::OS.to_string());

        Self {
            os: consts::OS.to_string(),
            arch,
            description,
        }
    }

    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Maps vendor spellings onto one name per architecture.
pub fn normalize_arch(arch: &str) -> String {
    match arch.trim().to_ascii_lowercase().as_str() {
        "arm64" | "aarch64" => "aarch64".to_string(),
        "x86_64" | "amd64" | "x64" => "x86_64".to_string(),
        "ppc64le" | "powerpc64le" => "ppc64le".to_string(),
        other => other.to_string(),
    }
}
