//! Trigger state carried between runs.
//!
//! After a sweep the description of every triggered entry is written to a
//! state file sealed with the machine cipher. The next run restores those
//! flags before sweeping, so change flags describe what moved since the
//! previous run.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DefinitionCipher, DefinitionStore};
use crate::error::{Result, ScoreError};
use crate::issues::Category;

/// Descriptions of the triggered entries, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerState {
    triggered: BTreeMap<Category, Vec<String>>,
}

impl TriggerState {
    /// Snapshot the triggered flags of every loaded document.
    pub fn capture(store: &DefinitionStore) -> Self {
        let triggered = store
            .documents()
            .map(|doc| {
                let descriptions: Vec<String> = doc
                    .metas()
                    .filter(|m| m.triggered)
                    .map(|m| m.description.clone())
                    .collect();
                (doc.category(), descriptions)
            })
            .collect();
        Self { triggered }
    }

    /// Set `triggered` on every entry whose description was recorded.
    /// Entries not recorded are cleared. Returns the number restored.
    pub fn apply(&self, store: &mut DefinitionStore) -> usize {
        let mut restored = 0;

        for category in Category::ALL {
            let Some(document) = store.get_mut(category) else {
                continue;
            };
            let recorded: HashSet<&str> = self
                .triggered
                .get(&category)
                .map(|v| v.iter().map(String::as_str).collect())
                .unwrap_or_default();

            for meta in document.metas_mut() {
                meta.triggered = recorded.contains(meta.description.as_str());
                if meta.triggered {
                    restored += 1;
                }
            }
        }

        restored
    }

    pub fn triggered_count(&self) -> usize {
        self.triggered.values().map(Vec::len).sum()
    }

    /// Read a state file. `Ok(None)` when there is none yet.
    pub fn load(path: &Path, cipher: &DefinitionCipher) -> Result<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let text = cipher.open(&raw).map_err(|e| ScoreError::Decrypt {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        let state = serde_json::from_str(&text).map_err(|e| ScoreError::Parse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(state))
    }

    pub fn save(&self, path: &Path, cipher: &DefinitionCipher) -> Result<()> {
        let text = serde_json::to_string(self)?;
        fs::write(path, cipher.seal(&text)).map_err(|e| ScoreError::Encrypt {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), triggered = self.triggered_count(), "saved trigger state");
        Ok(())
    }
}
