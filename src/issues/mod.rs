//! Typed issue definitions.
//!
//! A definition document is a category name plus an ordered list of
//! entries. The category selects the entry record at parse time, so a
//! document is one variant of [`IssueDocument`]:
//!
//! ```json
//! { "Category": "FileExistence",
//!   "Issues": [ { "points": 5, "description": "Removed netcat",
//!                 "path": "/usr/bin/nc", "fileShouldExist": false } ] }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::checks::registry;

/// Namespace grouping entries that share a comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    FileExistence,
    FileContents,
    RegistryValue,
    OsVersion,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::FileExistence,
        Self::FileContents,
        Self::RegistryValue,
        Self::OsVersion,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileExistence => write!(f, "FileExistence"),
            Self::FileContents => write!(f, "FileContents"),
            Self::RegistryValue => write!(f, "RegistryValue"),
            Self::OsVersion => write!(f, "OsVersion"),
        }
    }
}

/// Fields every entry carries regardless of category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMeta {
    /// Positive rewards a fix, negative penalizes breaking a hardening rule.
    pub points: i32,
    /// Used verbatim in ledger messages.
    pub description: String,
    /// Whether the condition was satisfied as of the last sweep.
    #[serde(default)]
    pub triggered: bool,
}

impl IssueMeta {
    pub fn new(points: i32, description: impl Into<String>) -> Self {
        Self {
            points,
            description: description.into(),
            triggered: false,
        }
    }

    pub fn is_penalty(&self) -> bool {
        self.points < 0
    }
}

/// Access to the shared fields of any entry record.
pub trait Issue {
    fn meta(&self) -> &IssueMeta;
    fn meta_mut(&mut self) -> &mut IssueMeta;
}

/// A file that should (or should not) be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceIssue {
    #[serde(flatten)]
    pub meta: IssueMeta,
    pub path: PathBuf,
    pub file_should_exist: bool,
}

/// A file that must contain every listed substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsIssue {
    #[serde(flatten)]
    pub meta: IssueMeta,
    pub path: PathBuf,
    pub contents: Vec<String>,
}

/// A named registry value compared against an expected value.
///
/// `registry_value: None` (or an empty string) matches a value that is absent.
/// A present value is compared as written, so `""` matches a present empty
/// value and `None` never matches a present one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryIssue {
    #[serde(flatten)]
    pub meta: IssueMeta,
    pub registry_path: String,
    pub registry_name: String,
    #[serde(default)]
    pub registry_value: Option<String>,
    #[serde(default = "default_should_match")]
    pub should_match: bool,
}

fn default_should_match() -> bool {
    true
}

impl RegistryIssue {
    /// Expected value as written in the definition.
    pub fn expected(&self) -> Option<&str> {
        self.registry_value.as_deref()
    }

    /// Whether the expectation is the "value absent" sentinel.
    pub fn expects_absent(&self) -> bool {
        self.expected().map_or(true, str::is_empty)
    }
}

/// The OS version string the machine is expected to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionIssue {
    #[serde(flatten)]
    pub meta: IssueMeta,
    pub version: String,
}

macro_rules! impl_issue {
    ($($ty:ty),*) => {
        $(impl Issue for $ty {
            fn meta(&self) -> &IssueMeta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut IssueMeta {
                &mut self.meta
            }
        })*
    };
}

impl_issue!(ExistenceIssue, ContentsIssue, RegistryIssue, VersionIssue);

/// One definition document: a category and its ordered entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Category", content = "Issues")]
pub enum IssueDocument {
    FileExistence(Vec<ExistenceIssue>),
    FileContents(Vec<ContentsIssue>),
    RegistryValue(Vec<RegistryIssue>),
    OsVersion(Vec<VersionIssue>),
}

impl IssueDocument {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn category(&self) -> Category {
        match self {
            Self::FileExistence(_) => Category::FileExistence,
            Self::FileContents(_) => Category::FileContents,
            Self::RegistryValue(_) => Category::RegistryValue,
            Self::OsVersion(_) => Category::OsVersion,
        }
    }

    pub fn len(&self) -> usize {
        self.metas().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared fields of every entry, in document order.
    pub fn metas(&self) -> Box<dyn Iterator<Item = &IssueMeta> + '_> {
        match self {
            Self::FileExistence(v) => Box::new(v.iter().map(|i| &i.meta)),
            Self::FileContents(v) => Box::new(v.iter().map(|i| &i.meta)),
            Self::RegistryValue(v) => Box::new(v.iter().map(|i| &i.meta)),
            Self::OsVersion(v) => Box::new(v.iter().map(|i| &i.meta)),
        }
    }

    pub fn metas_mut(&mut self) -> Box<dyn Iterator<Item = &mut IssueMeta> + '_> {
        match self {
            Self::FileExistence(v) => Box::new(v.iter_mut().map(|i| &mut i.meta)),
            Self::FileContents(v) => Box::new(v.iter_mut().map(|i| &mut i.meta)),
            Self::RegistryValue(v) => Box::new(v.iter_mut().map(|i| &mut i.meta)),
            Self::OsVersion(v) => Box::new(v.iter_mut().map(|i| &mut i.meta)),
        }
    }

    /// Structural checks serde cannot express. Returns the first problem found.
    pub fn check(&self) -> Result<(), String> {
        for (idx, meta) in self.metas().enumerate() {
            if meta.points == 0 {
                return Err(format!("issue #{idx} has zero points"));
            }
            if meta.description.trim().is_empty() {
                return Err(format!("issue #{idx} has an empty description"));
            }
        }

        match self {
            Self::FileContents(issues) => {
                if let Some(idx) = issues.iter().position(|i| i.contents.is_empty()) {
                    return Err(format!("issue #{idx} lists no expected contents"));
                }
            }
            Self::RegistryValue(issues) => {
                for (idx, issue) in issues.iter().enumerate() {
                    if registry::split_hive(&issue.registry_path).is_none() {
                        return Err(format!(
                            "issue #{idx} has unknown registry hive in '{}'",
                            issue.registry_path
                        ));
                    }
                }
            }
            Self::FileExistence(_) | Self::OsVersion(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_selects_entry_record() {
        let doc = IssueDocument::from_json(
            r#"{ "Category": "FileExistence",
                 "Issues": [ { "points": 5, "description": "Removed netcat",
                               "path": "/usr/bin/nc", "fileShouldExist": false } ] }"#,
        )
        .unwrap();

        assert_eq!(doc.category(), Category::FileExistence);
        assert_eq!(
            doc,
            IssueDocument::FileExistence(vec![ExistenceIssue {
                meta: IssueMeta::new(5, "Removed netcat"),
                path: PathBuf::from("/usr/bin/nc"),
                file_should_exist: false,
            }])
        );
    }

    #[test]
    fn registry_defaults() {
        let doc = IssueDocument::from_json(
            r#"{ "Category": "RegistryValue",
                 "Issues": [ { "points": 3, "description": "Disabled guest",
                               "registryPath": "HKLM\\SAM\\Guest",
                               "registryName": "Enabled" } ] }"#,
        )
        .unwrap();

        let IssueDocument::RegistryValue(issues) = doc else {
            panic!("wrong variant");
        };
        assert!(issues[0].should_match);
        assert_eq!(issues[0].expected(), None);
        assert!(issues[0].expects_absent());
        assert!(!issues[0].meta.triggered);
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        let err = IssueDocument::from_json(r#"{ "Category": "Firewall", "Issues": [] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn zero_points_fail_check() {
        let doc = IssueDocument::OsVersion(vec![VersionIssue {
            meta: IssueMeta::new(0, "Upgraded"),
            version: "22.04".into(),
        }]);
        assert!(doc.check().unwrap_err().contains("zero points"));
    }

    #[test]
    fn empty_contents_fail_check() {
        let doc = IssueDocument::FileContents(vec![ContentsIssue {
            meta: IssueMeta::new(2, "Hardened sshd"),
            path: PathBuf::from("/etc/ssh/sshd_config"),
            contents: vec![],
        }]);
        assert!(doc.check().is_err());
    }

    #[test]
    fn unknown_hive_fails_check() {
        let doc = IssueDocument::RegistryValue(vec![RegistryIssue {
            meta: IssueMeta::new(2, "Audit"),
            registry_path: "HKEY_NOWHERE\\Foo".into(),
            registry_name: "Bar".into(),
            registry_value: Some("1".into()),
            should_match: true,
        }]);
        assert!(doc.check().is_err());
    }

    #[test]
    fn triggered_state_survives_serialization() {
        let mut doc = IssueDocument::OsVersion(vec![VersionIssue {
            meta: IssueMeta::new(4, "Patched"),
            version: "10.0.19045".into(),
        }]);
        if let IssueDocument::OsVersion(issues) = &mut doc {
            issues[0].meta.triggered = true;
        }
        let back = IssueDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert!(back.metas().all(|m| m.triggered));
        assert_eq!(back.len(), 1);
    }
}
