//! Module tree walk: processing order, sub-module lookup, and the common
//! top-level directory.

use std::path::{Path, PathBuf};

use xvsa_config::reactor::DESCRIPTOR_FILE_NAME;
use xvsa_config::ModuleDescriptor;
use xvsa_util::error::UtilError;
use xvsa_util::paths;

use crate::configure::ModuleConfig;
use crate::error::EngineError;

/// The modules reachable from the root, in the order they are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkPlan {
    /// Indices into the configuration list, parents before children.
    pub order: Vec<usize>,
    /// Shallowest directory containing every walked module.
    pub top_level_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Walk the tree below `root`, depth-first, following declared sub-module paths.
///
/// Sub-module paths that do not resolve to a configured module are ignored.
/// A module reached twice is processed once.
///
/// # Errors
/// Returns an error if `root` has no configuration, a sub-module leads back to
/// a module on the current path, or two module directories share no ancestor.
pub fn plan(configs: &[ModuleConfig], root: &ModuleDescriptor) -> Result<WalkPlan, EngineError> {
    let root_file = paths::absolute(&root.descriptor_file());
    let root_index = configs
        .iter()
        .position(|c| c.artifact_key == root.artifact_key() && c.descriptor_file == root_file)
        .ok_or_else(|| EngineError::MissingConfiguration {
            module: root.to_string(),
        })?;

    let mut walker = Walker {
        configs,
        marks: vec![Mark::Unvisited; configs.len()],
        order: Vec::new(),
        stack: Vec::new(),
    };
    let top_level_dir = walker.visit(root_index, "")?;
    Ok(WalkPlan {
        order: walker.order,
        top_level_dir,
    })
}

struct Walker<'a> {
    configs: &'a [ModuleConfig],
    marks: Vec<Mark>,
    order: Vec<usize>,
    stack: Vec<String>,
}

impl Walker<'_> {
    fn visit(&mut self, index: usize, prefix: &str) -> Result<PathBuf, EngineError> {
        let configs = self.configs;
        let config = configs
            .get(index)
            .ok_or_else(|| EngineError::MissingConfiguration {
                module: index.to_string(),
            })?;

        self.set_mark(index, Mark::OnStack);
        self.stack.push(config.artifact_key.clone());
        self.order.push(index);

        let mut top_level_dir = config.base_dir.clone();
        let mut module_ids = Vec::new();
        for relative in &config.modules {
            let Some(child_index) = find_module(configs, &config.base_dir.join(relative)) else {
                tracing::debug!(
                    module = %config.key,
                    "sub-module '{relative}' does not match a configured module, ignoring"
                );
                continue;
            };
            let Some(child) = configs.get(child_index) else {
                continue;
            };

            match self.mark(child_index) {
                Mark::OnStack => {
                    let start = self
                        .stack
                        .iter()
                        .position(|k| *k == child.artifact_key)
                        .unwrap_or(0);
                    let mut chain: Vec<String> =
                        self.stack.get(start..).unwrap_or_default().to_vec();
                    chain.push(child.artifact_key.clone());
                    return Err(EngineError::ModuleCycle {
                        chain: chain.join(" -> "),
                    });
                }
                Mark::Done => {
                    tracing::debug!(
                        module = %config.key,
                        "sub-module {} already processed, skipping",
                        child.key
                    );
                    continue;
                }
                Mark::Unvisited => {}
            }

            let child_id = child.artifact_key.clone();
            let child_top = self.visit(child_index, &format!("{prefix}{child_id}."))?;
            module_ids.push(child_id);
            if !child_top.starts_with(&top_level_dir) {
                top_level_dir =
                    paths::common_ancestor(&top_level_dir, &child_top).map_err(|e| match e {
                        UtilError::NoCommonAncestor { first, second } => {
                            EngineError::NoCommonAncestor { first, second }
                        }
                        other => EngineError::Util(other),
                    })?;
            }
        }

        if !module_ids.is_empty() {
            tracing::debug!("xvsa.modules({prefix}) = {}", module_ids.join(","));
        }

        self.set_mark(index, Mark::Done);
        self.stack.pop();
        Ok(top_level_dir)
    }

    fn mark(&self, index: usize) -> Mark {
        self.marks.get(index).copied().unwrap_or(Mark::Unvisited)
    }

    fn set_mark(&mut self, index: usize, mark: Mark) {
        if let Some(slot) = self.marks.get_mut(index) {
            *slot = mark;
        }
    }
}

/// Match a declared sub-module path to a configuration.
///
/// A directory matches by its descriptor file first, then by base directory;
/// a file matches by descriptor file only. Paths that do not exist match nothing.
fn find_module(configs: &[ModuleConfig], module_path: &Path) -> Option<usize> {
    let canonical = std::fs::canonicalize(module_path).ok()?;
    if canonical.is_dir() {
        let descriptor = canonical.join(DESCRIPTOR_FILE_NAME);
        configs
            .iter()
            .position(|c| canonical_or_self(&c.descriptor_file) == descriptor)
            .or_else(|| {
                configs
                    .iter()
                    .position(|c| canonical_or_self(&c.base_dir) == canonical)
            })
    } else {
        configs
            .iter()
            .position(|c| canonical_or_self(&c.descriptor_file) == canonical)
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
