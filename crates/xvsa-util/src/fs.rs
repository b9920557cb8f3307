//! Filesystem utilities for xvsa-gather.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::UtilError;

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Remove a file. No error if the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn remove_file_if_exists(path: &Path) -> Result<(), UtilError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(UtilError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Write `items` to `path`, joined by `separator`, with no trailing separator.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_list<S: AsRef<str>>(path: &Path, items: &[S], separator: &str) -> Result<(), UtilError> {
    let content = items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(separator);
    std::fs::write(path, content).map_err(|source| UtilError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Whether `dir` is an existing directory whose permissions allow writing.
pub fn is_writable_dir(dir: &Path) -> bool {
    std::fs::metadata(dir).is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
}

/// Breadth-first search for any regular file under `dir` whose name ends with `suffix`.
///
/// Returns `false` if `dir` is missing, is not a directory, or any directory
/// on the way cannot be listed.
pub fn contains_file_with_suffix(dir: &Path, suffix: &str) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let mut queue = VecDeque::from([dir.to_path_buf()]);
    while let Some(current) = queue.pop_front() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            return false;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                let matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(suffix));
                if matches {
                    return true;
                }
            } else if path.is_dir() {
                queue.push_back(path);
            }
        }
    }
    false
}

/// Collect regular files under `dir` matching any of the glob `patterns`, sorted by path.
///
/// Patterns are relative to `dir` (e.g. `"**/*.java"`). Paths are returned absolute.
///
/// # Errors
/// Returns an error if a pattern is invalid.
pub fn collect_files(dir: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>, UtilError> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full_pattern = dir.join(pattern);
        let full_pattern_str = full_pattern.display().to_string();
        let matches = glob::glob(&full_pattern_str).map_err(|e| UtilError::GlobPattern {
            pattern: full_pattern_str.clone(),
            message: e.to_string(),
        })?;
        files.extend(
            matches
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .map(|p| crate::paths::absolute(&p)),
        );
    }
    files.sort();
    files.dedup();
    Ok(files)
}
