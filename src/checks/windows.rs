use std::path::{Path, PathBuf};

use super::files;
use super::registry::{self, RegistryReader};
use super::{version_matches, CheckResult, Comparator};
use crate::host::OsType;
use crate::issues::{ContentsIssue, ExistenceIssue, RegistryIssue, VersionIssue};

/// Comparator for Windows hosts. Paths may use `%VAR%` references.
pub struct WindowsComparator {
    os_version: String,
    registry: Box<dyn RegistryReader>,
}

impl WindowsComparator {
    pub fn new(os_version: String, registry: Box<dyn RegistryReader>) -> Self {
        Self {
            os_version,
            registry,
        }
    }

    fn resolve(&self, raw: &Path) -> PathBuf {
        let raw = raw.to_string_lossy();
        PathBuf::from(files::expand_percent_vars(&raw, |name| {
            std::env::var(name).ok()
        }))
    }
}

impl Comparator for WindowsComparator {
    fn platform(&self) -> OsType {
        OsType::Windows
    }

    fn file_exists(&self, issue: &ExistenceIssue) -> CheckResult {
        let path = self.resolve(&issue.path);
        let exists = files::file_exists(&path);
        Ok(files::existence_matches(
            exists,
            issue.file_should_exist,
            issue.meta.is_penalty(),
        ))
    }

    fn file_contents(&self, issue: &ContentsIssue) -> CheckResult {
        let path = self.resolve(&issue.path);
        Ok(files::contains_all(&path, &issue.contents))
    }

    fn registry_value(&self, issue: &RegistryIssue) -> CheckResult {
        Ok(registry::compare(self.registry.as_ref(), issue))
    }

    fn os_version(&self, issue: &VersionIssue) -> CheckResult {
        Ok(version_matches(&self.os_version, &issue.version))
    }
}
