//! Facts about the machine being scored.
//!
//! These are captured once at process start and are read-only for the rest
//! of the run. The store reads the program mode and machine name; the
//! comparator factory reads the OS type and version.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system family of the scored machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl OsType {
    /// OS family this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// What the current invocation is doing with the definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramMode {
    /// Instructor authoring: plaintext definitions are read directly.
    Author,
    /// Plaintext definitions are being sealed for distribution.
    Prepare,
    /// Deployed on the trainee image: sealed artifacts are decrypted on load.
    Start,
}

impl ProgramMode {
    pub fn requires_decryption(self) -> bool {
        matches!(self, Self::Start)
    }
}

/// Host facts supplied to the engine.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub os: OsType,
    pub os_version: String,
    pub machine_name: String,
    pub mode: ProgramMode,
}

impl HostContext {
    /// Detect the running machine.
    pub fn detect(mode: ProgramMode) -> Self {
        let os_version =
            sysinfo::System::long_os_version().unwrap_or_else(|| "unknown".to_string());
        let machine_name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        tracing::debug!(os = %OsType::current(), %os_version, %machine_name, "detected host");

        Self {
            os: OsType::current(),
            os_version,
            machine_name,
            mode,
        }
    }
}
