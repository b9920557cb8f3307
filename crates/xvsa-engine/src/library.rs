//! Per-library v-table artifacts, cached by output path across modules.
//!
//! The working directory is the cache index: an artifact that already exists
//! is reused as-is. Delete the directory to force regeneration.

use std::path::{Path, PathBuf};

use xvsa_frontend::{CommonOptions, LibraryCommand, ToolError, ToolRunner};

use crate::configure::ModuleConfig;
use crate::error::EngineError;

/// Extension of every object artifact.
pub const OBJECT_SUFFIX: &str = ".o";
/// Manifest of the artifacts a module links against.
const MANIFEST_SUFFIX: &str = ".lib.output.list";

/// Name-prefix filter over classpath entries.
#[derive(Debug, Clone, Default)]
pub struct LibraryFilter {
    criteria: Vec<String>,
    blacklist: bool,
}

impl LibraryFilter {
    /// `blacklist = true` excludes matching entries; `false` keeps only matching entries.
    pub fn new(criteria: &[String], blacklist: bool) -> Self {
        Self {
            criteria: criteria.to_vec(),
            blacklist,
        }
    }

    /// Whether an artifact should be produced for `library`.
    pub fn selects(&self, library: &Path) -> bool {
        let name = library
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let matched = self.criteria.iter().any(|c| name.starts_with(c.as_str()));
        if matched {
            !self.blacklist
        } else {
            self.blacklist
        }
    }
}

/// Deterministic artifact path for `library` inside `work_dir`.
///
/// Colons and dots in the file name are replaced so `guava-31.1.jar` maps to
/// `guava-31-1-jar.o`.
pub fn artifact_path(work_dir: &Path, library: &Path) -> Option<PathBuf> {
    let name = library.file_name()?.to_string_lossy();
    let stem = name.replace([':', '.'], "-");
    Some(work_dir.join(format!("{stem}{OBJECT_SUFFIX}")))
}

/// Path of a module's library manifest.
pub fn manifest_path(work_dir: &Path, config: &ModuleConfig) -> PathBuf {
    work_dir.join(format!("{}{MANIFEST_SUFFIX}", config.sanitized_key()))
}

/// What one library pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryReport {
    /// Artifact paths for every selected entry, in classpath order.
    pub selected: Vec<PathBuf>,
    pub generated: usize,
    pub reused: usize,
    /// Entries whose generation failed; they are still listed in the manifest.
    pub failed: usize,
    pub manifest: PathBuf,
}

/// Generates and reuses library artifacts in one working directory.
pub struct LibraryCache<'a, R: ToolRunner> {
    runner: &'a R,
    front_end: &'a Path,
    work_dir: &'a Path,
    jar_filter: LibraryFilter,
    class_filter: &'a [String],
    class_blacklist: bool,
}

impl<'a, R: ToolRunner> LibraryCache<'a, R> {
    pub fn new(runner: &'a R, front_end: &'a Path, work_dir: &'a Path) -> Self {
        Self {
            runner,
            front_end,
            work_dir,
            jar_filter: LibraryFilter::default(),
            class_filter: &[],
            class_blacklist: true,
        }
    }

    pub fn jar_filter(mut self, filter: LibraryFilter) -> Self {
        self.jar_filter = filter;
        self
    }

    /// Class-name filter forwarded to each library-only run.
    pub fn class_filter(mut self, criteria: &'a [String], blacklist: bool) -> Self {
        self.class_filter = criteria;
        self.class_blacklist = blacklist;
        self
    }

    /// Produce artifacts for the module's selected classpath entries and write its manifest.
    ///
    /// A failed generation is logged and does not stop the remaining entries.
    ///
    /// # Errors
    /// Returns an error if a library run cannot be launched or the manifest
    /// cannot be written.
    pub fn generate(
        &self,
        config: &ModuleConfig,
        common: &CommonOptions,
    ) -> Result<LibraryReport, EngineError> {
        let mut report = LibraryReport {
            manifest: manifest_path(self.work_dir, config),
            ..LibraryReport::default()
        };

        for library in &config.classpath {
            if !library.exists() || library.is_dir() {
                tracing::warn!(
                    "library jar does not exist or is a directory: {}",
                    library.display()
                );
                continue;
            }
            if !self.jar_filter.selects(library) {
                continue;
            }
            let Some(output) = artifact_path(self.work_dir, library) else {
                continue;
            };
            report.selected.push(output.clone());

            if output.exists() {
                tracing::info!(
                    "reusing formerly processed library {} under {}",
                    library.display(),
                    output.display()
                );
                report.reused += 1;
                continue;
            }

            tracing::info!("generating v-table for library {}", library.display());
            let args = LibraryCommand::new()
                .common(common)
                .class_filter(self.class_filter, self.class_blacklist)
                .library(library)
                .output(&output)
                .build_args()?;
            match self.runner.run(self.front_end, &args, self.work_dir) {
                Ok(run) if run.succeeded() => report.generated += 1,
                Ok(_) => {
                    tracing::warn!(
                        "v-table generation failed for {}, continuing",
                        library.display()
                    );
                    report.failed += 1;
                }
                Err(e @ ToolError::Launch { .. }) => return Err(e.into()),
                Err(e) => {
                    tracing::error!("v-table generation failed for {}: {e}", library.display());
                    report.failed += 1;
                }
            }
        }

        xvsa_util::fs::write_list(&report.manifest, &display_all(&report.selected), "\n")
            .map_err(|source| EngineError::WriteList {
                path: report.manifest.clone(),
                source,
            })?;
        Ok(report)
    }
}

fn display_all(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
