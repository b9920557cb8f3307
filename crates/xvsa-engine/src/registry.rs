//! Shared source registry: a JSON array of absolute source file paths that
//! several front-end runs append to.
//!
//! The front end only ever writes a fresh file, so every contribution is
//! loaded into memory and the file is removed before the next writer runs.
//! [`SourceRegistry::flush`] unions everything seen so far and writes it back
//! in one go.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use xvsa_util::paths;

use crate::error::EngineError;

/// Source file patterns collected from source roots.
const SOURCE_PATTERNS: &[&str] = &["**/*.java", "**/*.kt", "**/*.groovy"];

/// Accumulates source path groups for one run and persists their union.
#[derive(Debug)]
pub struct SourceRegistry {
    path: PathBuf,
    groups: Vec<Vec<String>>,
}

impl SourceRegistry {
    pub fn new(path: &Path) -> Self {
        Self {
            path: paths::absolute(path),
            groups: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of groups waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.groups.len()
    }

    /// Load and remove any registry file left on disk so the tool can write a new one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or removed, or its
    /// directory is not writable.
    pub fn pre_run(&mut self) -> Result<(), EngineError> {
        if self.path.exists() {
            tracing::info!("saving pre-existing source list {}", self.path.display());
            self.absorb_file()?;
        }
        let parent_writable = self
            .path
            .parent()
            .is_some_and(xvsa_util::fs::is_writable_dir);
        if !parent_writable {
            return Err(EngineError::RegistryNotWritable {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    /// Pick up what the tool wrote and persist the merged set.
    ///
    /// Returns the number of distinct paths written.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, removed, or rewritten.
    pub fn post_run(&mut self) -> Result<usize, EngineError> {
        if self.path.exists() {
            self.absorb_file()?;
        } else {
            tracing::warn!(
                "source list {} was not produced by the front end",
                self.path.display()
            );
        }
        self.flush()
    }

    /// Walk `dirs` for source files and add them as one group.
    ///
    /// Entries that are not directories are skipped with a warning.
    pub fn add_files_in_folders(&mut self, dirs: &[PathBuf]) {
        let mut group = Vec::new();
        for dir in dirs {
            if !dir.is_dir() {
                tracing::warn!("skipping non-folder source dir: {}", dir.display());
                continue;
            }
            match xvsa_util::fs::collect_files(dir, SOURCE_PATTERNS) {
                Ok(files) => {
                    tracing::debug!("found {} source files in {}", files.len(), dir.display());
                    group.extend(files.into_iter().map(|f| f.display().to_string()));
                }
                Err(e) => tracing::warn!("error gathering source files, continuing: {e}"),
            }
        }
        self.groups.push(group);
    }

    /// Register a set of source roots without a tool run in between.
    ///
    /// # Errors
    /// Returns an error if the registry file cannot be read or rewritten.
    pub fn contribute(&mut self, dirs: &[PathBuf]) -> Result<usize, EngineError> {
        self.pre_run()?;
        self.add_files_in_folders(dirs);
        self.flush()
    }

    /// Write the de-duplicated union of every pending group and clear them.
    ///
    /// # Errors
    /// Returns an error if the registry file cannot be written.
    pub fn flush(&mut self) -> Result<usize, EngineError> {
        tracing::debug!(
            "merging {} source groups into {}",
            self.pending(),
            self.path.display()
        );
        let total: BTreeSet<&str> = self
            .groups
            .iter()
            .flat_map(|group| group.iter().map(String::as_str))
            .collect();
        let count = total.len();
        let content =
            serde_json::to_string(&total).map_err(|e| EngineError::RegistryEncode {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        std::fs::write(&self.path, content).map_err(|source| EngineError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        self.groups.clear();
        tracing::info!("source list {} holds {count} files", self.path.display());
        Ok(count)
    }

    /// Read the on-disk file into a new group, then delete it.
    ///
    /// A file that is not a JSON array counts as empty.
    fn absorb_file(&mut self) -> Result<(), EngineError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| EngineError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(values) => {
                let group: Vec<String> = values
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect();
                tracing::debug!(
                    "loaded {} paths from {}, {} groups pending",
                    group.len(),
                    self.path.display(),
                    self.groups.len() + 1
                );
                self.groups.push(group);
            }
            Err(e) => tracing::warn!(
                "source list {} is empty or not valid JSON, ignoring it: {e}",
                self.path.display()
            ),
        }
        xvsa_util::fs::remove_file_if_exists(&self.path)?;
        Ok(())
    }
}
