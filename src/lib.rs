//! hardenscore — scoring engine for hardening exercises.
//!
//! An instructor ships a machine image with known misconfigurations and a
//! set of encrypted issue definitions. Each sweep checks the live machine
//! against every definition and keeps a running score of what the trainee
//! has fixed (or broken).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use hardenscore::config::Config;
//! use hardenscore::host::{HostContext, ProgramMode};
//! use hardenscore::Engine;
//!
//! let config_path = Path::new(".hardenscore.toml");
//! let config = Config::load(config_path).unwrap();
//! let host = HostContext::detect(ProgramMode::Start);
//! let mut engine = Engine::open(&config, config_path, host).unwrap();
//! let report = engine.sweep();
//! println!("Score: {}", report.ledger.net_points());
//! ```

pub mod checks;
pub mod config;
pub mod error;
pub mod evaluators;
pub mod host;
pub mod issues;
pub mod ledger;
pub mod output;
pub mod store;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use checks::Comparator;
use config::Config;
use error::Result;
use host::{HostContext, OsType};
use ledger::ScoringLedger;
use output::OutputFormat;
use store::{
    DefinitionCipher, DefinitionStore, LoadSummary, PrepareSummary, TriggerState, ValidationReport,
};

/// Ledger read-out after one sweep, for reporters and notifiers.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub os: OsType,
    pub os_version: String,
    pub checked_at: DateTime<Utc>,
    pub ledger: ScoringLedger,
}

impl SweepReport {
    pub fn new(os: OsType, os_version: String, ledger: ScoringLedger) -> Self {
        Self {
            os,
            os_version,
            checked_at: Utc::now(),
            ledger,
        }
    }
}

/// Loaded definitions, the platform comparator and the running ledger.
///
/// The caller owns the single instance; sweeps take `&mut self`, so only
/// one can be in flight at a time.
pub struct Engine {
    host: HostContext,
    store: DefinitionStore,
    comparator: Box<dyn Comparator>,
    ledger: ScoringLedger,
    load_summary: LoadSummary,
    state_path: Option<PathBuf>,
}

impl Engine {
    /// Load every definition, pick the comparator for this host, and restore
    /// trigger state saved by the previous run.
    pub fn open(config: &Config, config_path: &Path, host: HostContext) -> Result<Self> {
        let comparator = checks::comparator_for(&host)?;
        let mut store = DefinitionStore::new(
            config.definitions_root(config_path),
            &config.definitions,
        );
        let load_summary = store.load_all(&host)?;

        let mut engine = Self::with_parts(host, store, comparator, load_summary);
        engine.state_path = config.state_path(config_path);
        engine.restore_state();
        Ok(engine)
    }

    /// Assemble an engine from already-built parts.
    pub fn with_parts(
        host: HostContext,
        store: DefinitionStore,
        comparator: Box<dyn Comparator>,
        load_summary: LoadSummary,
    ) -> Self {
        Self {
            host,
            store,
            comparator,
            ledger: ScoringLedger::new(),
            load_summary,
            state_path: None,
        }
    }

    fn cipher(&self) -> DefinitionCipher {
        DefinitionCipher::for_machine(&self.host.machine_name)
    }

    /// A missing or unreadable state file starts every entry untriggered.
    fn restore_state(&mut self) {
        let Some(path) = self.state_path.clone() else {
            return;
        };
        match TriggerState::load(&path, &self.cipher()) {
            Ok(Some(state)) => {
                let restored = state.apply(&mut self.store);
                tracing::debug!(path = %path.display(), restored, "restored trigger state");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring saved trigger state"),
        }
    }

    /// Write the current trigger flags for the next run. No-op when
    /// persistence is off.
    pub fn save_state(&self) -> Result<()> {
        match &self.state_path {
            Some(path) => TriggerState::capture(&self.store).save(path, &self.cipher()),
            None => Ok(()),
        }
    }

    /// Run one sweep and return a snapshot of the ledger.
    pub fn sweep(&mut self) -> SweepReport {
        evaluators::sweep(&mut self.store, self.comparator.as_ref(), &mut self.ledger);
        SweepReport::new(
            self.host.os,
            self.host.os_version.clone(),
            self.ledger.clone(),
        )
    }

    /// Clear the ledger between sweeps without checking anything.
    pub fn reset_scoring_data(&mut self) {
        self.ledger.reset();
    }

    pub fn ledger(&self) -> &ScoringLedger {
        &self.ledger
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn load_summary(&self) -> LoadSummary {
        self.load_summary
    }
}

/// Validate every plaintext definition under the configured root.
pub fn validate(config: &Config, config_path: &Path) -> Result<ValidationReport> {
    let store = DefinitionStore::new(config.definitions_root(config_path), &config.definitions);
    store.validate_all()
}

/// Seal every plaintext definition for `machine_name`.
pub fn prepare(config: &Config, config_path: &Path, machine_name: &str) -> Result<PrepareSummary> {
    let store = DefinitionStore::new(config.definitions_root(config_path), &config.definitions);
    store.prepare_all(&DefinitionCipher::for_machine(machine_name))
}

/// Render a sweep report in the specified format.
pub fn render_report(report: &SweepReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::host::ProgramMode;
    use crate::issues::Category;
    use std::path::PathBuf;

    const FIXTURES: &str = "tests/fixtures/issues";

    fn linux_host(mode: ProgramMode) -> HostContext {
        HostContext {
            os: OsType::Linux,
            os_version: "Ubuntu 22.04.4 LTS".into(),
            machine_name: "trainee-01".into(),
            mode,
        }
    }

    fn fixture_config() -> (Config, PathBuf) {
        let mut config = Config::default();
        config.definitions.root = PathBuf::from(FIXTURES);
        config.state.persist = false;
        (config, PathBuf::from(".hardenscore.toml"))
    }

    #[test]
    fn fixture_definitions_validate() {
        let (config, path) = fixture_config();
        let report = validate(&config, &path).unwrap();
        assert_eq!(report.checked, 4);
        assert!(report.passed(), "{:?}", report.failures);
    }

    #[test]
    fn fixture_sweep_on_linux() {
        let (config, path) = fixture_config();
        let mut engine = Engine::open(&config, &path, linux_host(ProgramMode::Author)).unwrap();

        assert_eq!(engine.load_summary().loaded, 4);
        assert_eq!(engine.store().len(), 4);

        let report = engine.sweep();
        let ledger = &report.ledger;

        // The version entry matches the host; the fixture paths do not exist.
        assert!(ledger
            .points_gained_descriptions
            .contains(&"Upgraded to Ubuntu 22.04.4 - 4 points".to_string()));
        assert!(ledger
            .points_gained_descriptions
            .contains(&"Removed netcat binary - 5 points".to_string()));
        assert!(ledger.change_status.gained);
        // Registry entries are skipped on Linux and never triggered.
        assert!(engine
            .store()
            .get(Category::RegistryValue)
            .unwrap()
            .metas()
            .all(|m| !m.triggered));

        let again = engine.sweep();
        assert_eq!(again.ledger.net_points(), report.ledger.net_points());
        assert!(again.ledger.change_status.is_unchanged());
    }

    #[test]
    fn reset_scoring_data_clears_ledger() {
        let (config, path) = fixture_config();
        let mut engine = Engine::open(&config, &path, linux_host(ProgramMode::Author)).unwrap();
        engine.sweep();
        assert!(engine.ledger().points_gained_total > 0);

        engine.reset_scoring_data();
        assert_eq!(engine.ledger(), &ScoringLedger::default());
    }

    #[test]
    fn unsupported_platform_is_reported_before_loading() {
        let (config, path) = fixture_config();
        let mut host = linux_host(ProgramMode::Author);
        host.os = OsType::MacOs;
        assert!(matches!(
            Engine::open(&config, &path, host),
            Err(error::ScoreError::UnsupportedPlatform(_))
        ));
    }
}
