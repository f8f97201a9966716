use std::path::{Path, PathBuf};

use super::files;
use super::{version_matches, CheckResult, Comparator, Unsupported};
use crate::host::OsType;
use crate::issues::{Category, ContentsIssue, ExistenceIssue, RegistryIssue, VersionIssue};

/// Comparator for Linux hosts. Paths may use `~`, `$VAR` and `${VAR}`.
/// There is no registry, so registry entries are unsupported.
pub struct LinuxComparator {
    os_version: String,
    home: Option<PathBuf>,
}

impl LinuxComparator {
    pub fn new(os_version: String) -> Self {
        Self {
            os_version,
            home: dirs::home_dir(),
        }
    }

    fn resolve(&self, raw: &Path) -> PathBuf {
        let raw = raw.to_string_lossy();
        PathBuf::from(files::expand_shell_vars(&raw, self.home.as_deref(), |name| {
            std::env::var(name).ok()
        }))
    }
}

impl Comparator for LinuxComparator {
    fn platform(&self) -> OsType {
        OsType::Linux
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

    fn registry_value(&self, _issue: &RegistryIssue) -> CheckResult {
        Err(Unsupported {
            category: Category::RegistryValue,
            platform: OsType::Linux,
        })
    }

    fn os_version(&self, issue: &VersionIssue) -> CheckResult {
        Ok(version_matches(&self.os_version, &issue.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueMeta;

    fn existence(path: PathBuf, should_exist: bool, points: i32) -> ExistenceIssue {
        ExistenceIssue {
            meta: IssueMeta::new(points, "file rule"),
            path,
            file_should_exist: should_exist,
        }
    }

    #[test]
    fn absent_file_that_should_be_absent_matches() {
        let dir = tempfile::tempdir().unwrap();
        let cmp = LinuxComparator::new("Ubuntu 22.04".into());
        let entry = existence(dir.path().join("nc"), false, 5);
        assert_eq!(cmp.file_exists(&entry), Ok(true));
    }

    #[test]
    fn present_file_that_should_exist_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auditd.conf");
        std::fs::write(&path, "log_file = /var/log/audit/audit.log").unwrap();

        let cmp = LinuxComparator::new("Ubuntu 22.04".into());
        assert_eq!(cmp.file_exists(&existence(path.clone(), true, 5)), Ok(true));
        assert_eq!(cmp.file_exists(&existence(path, false, 5)), Ok(false));
    }

    #[test]
    fn contents_checked_through_comparator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("login.defs");
        std::fs::write(&path, "PASS_MAX_DAYS 90\nPASS_MIN_DAYS 7\n").unwrap();

        let cmp = LinuxComparator::new("Ubuntu 22.04".into());
        let entry = ContentsIssue {
            meta: IssueMeta::new(4, "Password aging"),
            path,
            contents: vec!["PASS_MAX_DAYS 90".into(), "PASS_MIN_DAYS 7".into()],
        };
        assert_eq!(cmp.file_contents(&entry), Ok(true));
    }

    #[test]
    fn tilde_resolves_to_home_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".bash_history"), "").unwrap();

        let cmp = LinuxComparator {
            os_version: "Ubuntu 22.04".into(),
            home: Some(dir.path().to_path_buf()),
        };
        let entry = existence(PathBuf::from("~/.bash_history"), true, 3);
        assert_eq!(cmp.file_exists(&entry), Ok(true));
    }

    #[test]
    fn registry_is_unsupported() {
        let cmp = LinuxComparator::new("Ubuntu 22.04".into());
        let err = cmp
            .registry_value(&crate::checks::registry::tests::issue(Some("1"), true))
            .unwrap_err();
        assert_eq!(err.category, Category::RegistryValue);
        assert_eq!(err.platform, OsType::Linux);
    }
}
