//! Path-set arithmetic over module roots: resolution, existence filtering,
//! nested-path collapsing, and common-ancestor computation.
//!
//! All comparisons are component-wise (`Path::starts_with`), so `/a/bc` is
//! never treated as a child of `/a/b`.

use std::path::{Component, Path, PathBuf};

use crate::error::UtilError;

/// Resolve a possibly relative path against `base_dir`.
///
/// Surrounding whitespace is trimmed. Returns `None` for a missing or blank
/// input. The result is absolute but not canonicalized, so symlinks and `..`
/// segments are preserved.
pub fn resolve(path: Option<&str>, base_dir: &Path) -> Option<PathBuf> {
    let trimmed = path?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = Path::new(trimmed);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    };
    Some(absolute(&joined))
}

/// Resolve every entry of `paths` against `base_dir`, dropping blank entries.
pub fn resolve_all<'a, I>(paths: I, base_dir: &Path) -> Vec<PathBuf>
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .filter_map(|p| resolve(Some(p), base_dir))
        .collect()
}

/// Split a comma-separated path list, dropping empty segments.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keep only the paths that exist on disk, preserving order.
pub fn filter_existing<I>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    paths.into_iter().filter(|p| p.exists()).collect()
}

/// Drop every path that has a strict ancestor elsewhere in the set.
///
/// Order is preserved and surviving paths are returned unchanged. Equal
/// paths are not ancestors of each other, so duplicates both survive.
pub fn collapse_nested(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|child| !paths.iter().any(|parent| is_strict_child(child, parent)))
        .cloned()
        .collect()
}

fn is_strict_child(maybe_child: &Path, possible_parent: &Path) -> bool {
    maybe_child != possible_parent && maybe_child.starts_with(possible_parent)
}

/// Find the deepest directory that contains both `first` and `second`.
///
/// If one path is an ancestor of (or equal to) the other, the shorter one is
/// returned. The filesystem root never counts as a common ancestor.
///
/// # Errors
/// Returns `UtilError::NoCommonAncestor` when the walk up from `first` reaches
/// the root without finding a prefix of `second`.
pub fn common_ancestor(first: &Path, second: &Path) -> Result<PathBuf, UtilError> {
    if first.starts_with(second) {
        return Ok(second.to_path_buf());
    }
    if second.starts_with(first) {
        return Ok(first.to_path_buf());
    }
    let mut candidate = first.parent();
    while let Some(dir) = candidate {
        // `dir` is the root (or the empty relative path) when it has no parent.
        if dir.parent().is_none() {
            break;
        }
        if second.starts_with(dir) {
            return Ok(dir.to_path_buf());
        }
        candidate = dir.parent();
    }
    Err(UtilError::NoCommonAncestor {
        first: first.to_path_buf(),
        second: second.to_path_buf(),
    })
}

/// Remove candidates that live under the module's build output directory.
///
/// Both sides are relativized to `base_dir` first, so a build directory
/// configured as `target` and a candidate given as `/abs/module/target/gen`
/// compare equal. A build directory equal to `base_dir` removes nothing.
pub fn remove_under_build_output(
    candidates: Vec<PathBuf>,
    build_output_dir: &Path,
    base_dir: &Path,
) -> Vec<PathBuf> {
    let base = normalize_lexically(&absolute(base_dir));
    let target = normalize_lexically(&absolute(&base.join(build_output_dir)));
    let target_relative = relativize(&base, &target);
    if target_relative.as_os_str().is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|candidate| {
            let full = normalize_lexically(&absolute(&base.join(candidate)));
            !relativize(&base, &full).starts_with(&target_relative)
        })
        .collect()
}

/// Make `path` absolute against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Collapse `.` and `..` segments without resolving symlinks.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `path` relative to `base`, inserting `..` where `path` leaves `base`.
///
/// Both inputs are expected to be absolute and normalized.
pub fn relativize(base: &Path, path: &Path) -> PathBuf {
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let shared = base_parts
        .iter()
        .zip(path_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in base_parts.iter().skip(shared) {
        out.push("..");
    }
    for part in path_parts.iter().skip(shared) {
        out.push(part.as_os_str());
    }
    out
}
