pub mod files;
pub mod linux;
pub mod registry;
pub mod windows;

use thiserror::Error;

use crate::error::{Result, ScoreError};
use crate::host::{HostContext, OsType};
use crate::issues::{Category, ContentsIssue, ExistenceIssue, RegistryIssue, VersionIssue};

/// A category a comparator cannot check on its platform.
///
/// Evaluators treat this as "abandon the category for this sweep".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{category} checks are not implemented on {platform}")]
pub struct Unsupported {
    pub category: Category,
    pub platform: OsType,
}

pub type CheckResult = std::result::Result<bool, Unsupported>;

/// Answers "does the machine currently match this entry?" for one platform.
///
/// Access failures inside a check are logged and reported as `Ok(false)`;
/// only a category the platform cannot check at all returns `Err`.
pub trait Comparator: Send + Sync {
    /// The platform this comparator inspects.
    fn platform(&self) -> OsType;

    fn file_exists(&self, issue: &ExistenceIssue) -> CheckResult;

    fn file_contents(&self, issue: &ContentsIssue) -> CheckResult;

    fn registry_value(&self, issue: &RegistryIssue) -> CheckResult;

    fn os_version(&self, issue: &VersionIssue) -> CheckResult;
}

/// Pick the comparator for the detected OS. Called once per process.
pub fn comparator_for(host: &HostContext) -> Result<Box<dyn Comparator>> {
    match host.os {
        OsType::Windows => windows_comparator(host),
        OsType::Linux => Ok(Box::new(linux::LinuxComparator::new(
            host.os_version.clone(),
        ))),
        other => Err(ScoreError::UnsupportedPlatform(other.to_string())),
    }
}

#[cfg(windows)]
fn windows_comparator(host: &HostContext) -> Result<Box<dyn Comparator>> {
    Ok(Box::new(windows::WindowsComparator::new(
        host.os_version.clone(),
        Box::new(registry::WindowsRegistry),
    )))
}

#[cfg(not(windows))]
fn windows_comparator(_host: &HostContext) -> Result<Box<dyn Comparator>> {
    Err(ScoreError::UnsupportedPlatform(
        "windows (built without registry access)".into(),
    ))
}

/// Exact, case-sensitive OS version comparison.
pub(crate) fn version_matches(current: &str, expected: &str) -> bool {
    current == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ProgramMode;

    fn host(os: OsType) -> HostContext {
        HostContext {
            os,
            os_version: "Linux 22.04 Ubuntu".into(),
            machine_name: "trainee-01".into(),
            mode: ProgramMode::Author,
        }
    }

    #[test]
    fn linux_gets_linux_comparator() {
        let comparator = comparator_for(&host(OsType::Linux)).unwrap();
        assert_eq!(comparator.platform(), OsType::Linux);
    }

    #[test]
    fn unknown_platform_fails_at_construction() {
        let err = comparator_for(&host(OsType::MacOs)).err().unwrap();
        assert!(matches!(err, ScoreError::UnsupportedPlatform(p) if p == "macos"));
        assert!(comparator_for(&host(OsType::Other)).is_err());
    }

    #[test]
    fn version_comparison_is_case_sensitive() {
        assert!(version_matches("Windows 10 Pro", "Windows 10 Pro"));
        assert!(!version_matches("Windows 10 Pro", "windows 10 pro"));
        assert!(!version_matches("22.04", "22.04 "));
    }
}
