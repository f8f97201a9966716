//! Definition store: finds definition documents on disk, validates them,
//! indexes them by category, and seals them for deployment.

pub mod cipher;
pub mod state;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::DefinitionSettings;
use crate::error::{Result, ScoreError};
use crate::host::HostContext;
use crate::issues::{Category, IssueDocument};

pub use cipher::DefinitionCipher;
pub use state::TriggerState;

/// A definition file that failed validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of validating every authoring document under the root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub checked: usize,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Counters from one [`DefinitionStore::load_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped_unreadable: usize,
    pub skipped_undecryptable: usize,
    pub skipped_duplicate: usize,
}

/// Counters from one successful [`DefinitionStore::prepare_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrepareSummary {
    pub sealed: usize,
    pub removed_dirs: usize,
}

/// Category-indexed definition documents rooted at one directory.
#[derive(Debug)]
pub struct DefinitionStore {
    root: PathBuf,
    plain_extension: String,
    sealed_extension: String,
    documents: BTreeMap<Category, IssueDocument>,
}

impl DefinitionStore {
    pub fn new(root: impl Into<PathBuf>, settings: &DefinitionSettings) -> Self {
        Self {
            root: root.into(),
            plain_extension: settings.plain_extension.clone(),
            sealed_extension: settings.sealed_extension.clone(),
            documents: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse and check one authoring document.
    pub fn validate(path: &Path) -> std::result::Result<(), ValidationFailure> {
        let failure = |message: String| ValidationFailure {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
        parse_document(path, &text)
            .map(|_| ())
            .map_err(|e| failure(e.to_string()))
    }

    /// Validate every authoring document; never stops at the first failure.
    pub fn validate_all(&self) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        for path in self.files_with_extension(&self.plain_extension)? {
            report.checked += 1;
            if let Err(failure) = Self::validate(&path) {
                tracing::warn!(
                    path = %failure.path.display(),
                    error = %failure.message,
                    "definition failed validation"
                );
                report.failures.push(failure);
            }
        }

        Ok(report)
    }

    /// Read every definition under the root and register it by category.
    ///
    /// In [`ProgramMode::Start`](crate::host::ProgramMode::Start) sealed
    /// artifacts are read and decrypted; otherwise plaintext documents are.
    /// Unreadable, undecryptable and duplicate documents are skipped with a
    /// warning. A document that decrypts but does not parse aborts the load.
    pub fn load_all(&mut self, host: &HostContext) -> Result<LoadSummary> {
        let decrypt = host.mode.requires_decryption();
        let extension = if decrypt {
            self.sealed_extension.clone()
        } else {
            self.plain_extension.clone()
        };
        let cipher = decrypt.then(|| DefinitionCipher::for_machine(&host.machine_name));

        let mut summary = LoadSummary::default();

        for path in self.files_with_extension(&extension)? {
            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read definition, skipping");
                    summary.skipped_unreadable += 1;
                    continue;
                }
            };

            let text = match &cipher {
                Some(cipher) => match cipher.open(&raw) {
                    Ok(text) => text,
                    Err(e) => {
                        let err = ScoreError::Decrypt {
                            file: path.display().to_string(),
                            message: e.to_string(),
                        };
                        tracing::warn!(error = %err, "skipping definition");
                        summary.skipped_undecryptable += 1;
                        continue;
                    }
                },
                None => raw,
            };

            let document = parse_document(&path, &text)?;
            let category = document.category();

            if self.register(document) {
                tracing::debug!(path = %path.display(), %category, "registered definitions");
                summary.loaded += 1;
            } else {
                tracing::warn!(path = %path.display(), %category, "duplicate category, keeping the first document");
                summary.skipped_duplicate += 1;
            }
        }

        tracing::info!(
            root = %self.root.display(),
            loaded = summary.loaded,
            unreadable = summary.skipped_unreadable,
            undecryptable = summary.skipped_undecryptable,
            duplicate = summary.skipped_duplicate,
            "definitions loaded"
        );

        Ok(summary)
    }

    /// Seal every authoring document for deployment.
    ///
    /// Each document is written next to its source under a random
    /// 8-character name with the sealed extension. Sources are deleted and
    /// empty directories pruned only once every document has been sealed;
    /// on any failure the artifacts written so far are removed and the
    /// sources are left untouched.
    pub fn prepare_all(&self, cipher: &DefinitionCipher) -> Result<PrepareSummary> {
        let sources = self.files_with_extension(&self.plain_extension)?;
        let mut written: Vec<PathBuf> = Vec::with_capacity(sources.len());

        for source in &sources {
            match self.seal_one(source, cipher) {
                Ok(dest) => written.push(dest),
                Err(e) => {
                    for artifact in &written {
                        if let Err(rm) = fs::remove_file(artifact) {
                            tracing::warn!(path = %artifact.display(), error = %rm, "cannot remove partial artifact");
                        }
                    }
                    tracing::warn!(path = %source.display(), error = %e, "preparation aborted, sources kept");
                    return Err(e);
                }
            }
        }

        remove_sources(&sources)?;
        let removed_dirs = prune_empty_dirs(&self.root, true)?;

        let summary = PrepareSummary {
            sealed: written.len(),
            removed_dirs,
        };
        tracing::info!(sealed = summary.sealed, removed_dirs, "definitions prepared");
        Ok(summary)
    }

    fn seal_one(&self, source: &Path, cipher: &DefinitionCipher) -> Result<PathBuf> {
        let encrypt_err = |message: String| ScoreError::Encrypt {
            file: source.display().to_string(),
            message,
        };

        let text = fs::read_to_string(source).map_err(|e| encrypt_err(e.to_string()))?;
        parse_document(source, &text)?;

        let dir = source.parent().unwrap_or(&self.root);
        let dest = unique_artifact_path(dir, &self.sealed_extension);
        fs::write(&dest, cipher.seal(&text)).map_err(|e| encrypt_err(e.to_string()))?;

        tracing::debug!(source = %source.display(), dest = %dest.display(), "sealed definition");
        Ok(dest)
    }

    /// Register a document unless its category is already taken.
    pub fn register(&mut self, document: IssueDocument) -> bool {
        match self.documents.entry(document.category()) {
            Entry::Vacant(slot) => {
                slot.insert(document);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, category: Category) -> Option<&IssueDocument> {
        self.documents.get(&category)
    }

    pub fn get_mut(&mut self, category: Category) -> Option<&mut IssueDocument> {
        self.documents.get_mut(&category)
    }

    pub fn documents(&self) -> impl Iterator<Item = &IssueDocument> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Files under the root with `extension`, in a stable order.
    fn files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ScoreError::Config(format!(
                "definitions root {} is not a directory",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| ScoreError::Io(e.into()))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
            {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }
}

fn parse_document(path: &Path, text: &str) -> Result<IssueDocument> {
    let document = IssueDocument::from_json(text).map_err(|e| ScoreError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    document.check().map_err(|message| ScoreError::Validation {
        file: path.display().to_string(),
        message,
    })?;
    Ok(document)
}

fn unique_artifact_path(dir: &Path, extension: &str) -> PathBuf {
    loop {
        let stem: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let candidate = dir.join(format!("{stem}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
    }
}

/// Delete sealed sources in order. On the first failure every source not yet
/// deleted is logged before the error is returned.
fn remove_sources(sources: &[PathBuf]) -> io::Result<()> {
    for (idx, source) in sources.iter().enumerate() {
        if let Err(e) = fs::remove_file(source) {
            tracing::warn!(
                path = %source.display(),
                error = %e,
                "cannot remove plaintext source after sealing"
            );
            for remaining in &sources[idx..] {
                tracing::warn!(path = %remaining.display(), "plaintext source left in place");
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Remove empty directories depth-first. The starting directory is kept
/// when `keep_self` is set. Returns the number of directories removed.
fn prune_empty_dirs(dir: &Path, keep_self: bool) -> io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            removed += prune_empty_dirs(&entry.path(), false)?;
        }
    }

    if !keep_self && fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
        removed += 1;
    }

    Ok(removed)
}
