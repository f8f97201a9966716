use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::output::OutputFormat;

/// Top-level configuration from `.hardenscore.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub definitions: DefinitionSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub state: StateSettings,
}

/// Where issue definitions live and how they are named on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSettings {
    /// Definitions directory. Relative paths resolve against the config file's directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Extension of plaintext authoring documents.
    #[serde(default = "default_plain_extension")]
    pub plain_extension: String,
    /// Extension of encrypted deployment artifacts.
    #[serde(default = "default_sealed_extension")]
    pub sealed_extension: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("issues")
}

fn default_plain_extension() -> String {
    "json".into()
}

fn default_sealed_extension() -> String {
    "dat".into()
}

impl Default for DefinitionSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            plain_extension: default_plain_extension(),
            sealed_extension: default_sealed_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

fn default_format() -> OutputFormat {
    OutputFormat::Console
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

/// Where trigger state is kept between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSettings {
    /// Sealed state file. Relative paths resolve against the config file's directory.
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
    /// Restore and save trigger state around each `check`.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".hardenscore-state")
}

fn default_persist() -> bool {
    true
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            persist: default_persist(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        let defs = &self.definitions;
        if defs.plain_extension.is_empty() || defs.sealed_extension.is_empty() {
            return Err(ScoreError::Config(
                "definition extensions must not be empty".into(),
            ));
        }
        if defs.plain_extension.eq_ignore_ascii_case(&defs.sealed_extension) {
            return Err(ScoreError::Config(format!(
                "plain and sealed extensions are both '{}'",
                defs.plain_extension
            )));
        }
        Ok(())
    }

    /// Definitions root resolved against the directory holding the config file.
    pub fn definitions_root(&self, config_path: &Path) -> PathBuf {
        resolve_beside(config_path, &self.definitions.root)
    }

    /// State file path, or `None` when persistence is off.
    pub fn state_path(&self, config_path: &Path) -> Option<PathBuf> {
        self.state
            .persist
            .then(|| resolve_beside(config_path, &self.state.path))
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# hardenscore configuration

[definitions]
# Directory holding issue definitions, relative to this file.
root = "issues"

# Extension of plaintext authoring documents.
plain_extension = "json"

# Extension of encrypted artifacts produced by `hardenscore prepare`.
sealed_extension = "dat"

[report]
# Report format for `hardenscore check` (console, json).
format = "console"

[state]
# Sealed file remembering which issues were found on the previous check.
path = ".hardenscore-state"
persist = true
"#
    }
}

fn resolve_beside(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(path)
}
