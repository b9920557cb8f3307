//! Descriptive lists written next to a module's artifacts, usable without the front end.

use std::path::{Path, PathBuf};

use crate::configure::ModuleConfig;
use crate::error::EngineError;
use crate::registry::SourceRegistry;

/// Files written by [`dump_module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFiles {
    /// Existing main classpath entries.
    pub libraries: PathBuf,
    /// Main compiled-class directory.
    pub class_dirs: PathBuf,
    /// Resolved source roots.
    pub source_roots: PathBuf,
}

impl DumpFiles {
    pub fn for_module(work_dir: &Path, config: &ModuleConfig) -> Self {
        let key = config.sanitized_key();
        Self {
            libraries: work_dir.join(format!("{key}.lib.list")),
            class_dirs: work_dir.join(format!("{key}.dir.list")),
            source_roots: work_dir.join(format!("{key}.src.list")),
        }
    }
}

/// Write the module's lists into `work_dir` and, when a registry is
/// configured, contribute its source files to it.
///
/// # Errors
/// Returns an error if a list cannot be written or the registry cannot be updated.
pub fn dump_module(
    config: &ModuleConfig,
    work_dir: &Path,
    registry: Option<&mut SourceRegistry>,
) -> Result<DumpFiles, EngineError> {
    let files = DumpFiles::for_module(work_dir, config);

    let libraries: Vec<&PathBuf> = config.classpath.iter().filter(|p| p.exists()).collect();
    write(&files.libraries, &libraries)?;
    write(&files.class_dirs, &config.output_dir.iter().collect::<Vec<_>>())?;
    write(&files.source_roots, &config.sources.iter().collect::<Vec<_>>())?;

    match registry {
        Some(_) if config.sources.is_empty() => {
            tracing::error!(module = %config.key, "no source directory found, source list not updated");
        }
        Some(registry) => {
            tracing::info!(
                module = %config.key,
                "dumping source files into {}",
                registry.path().display()
            );
            registry.contribute(&config.sources)?;
        }
        None => {
            tracing::debug!(module = %config.key, "no source list configured, skipping source file dump");
        }
    }
    Ok(files)
}

fn write(path: &Path, items: &[&PathBuf]) -> Result<(), EngineError> {
    tracing::debug!("writing list file {}", path.display());
    let lines: Vec<String> = items.iter().map(|p| p.display().to_string()).collect();
    xvsa_util::fs::write_list(path, &lines, "\n").map_err(|source| EngineError::WriteList {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use xvsa_config::Packaging;

    use super::*;

    fn config(root: &Path) -> ModuleConfig {
        let src = root.join("src");
        let classes = root.join("classes");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&classes).unwrap();
        fs::write(src.join("Main.java"), "class Main {}").unwrap();
        let lib = root.join("lib.jar");
        fs::write(&lib, b"").unwrap();
        ModuleConfig {
            key: "com.acme:core".to_owned(),
            artifact_key: "com.acme:core".to_owned(),
            version: "1.0".to_owned(),
            name: "core".to_owned(),
            description: None,
            base_dir: root.to_path_buf(),
            descriptor_file: root.join("pom.xml"),
            build_dir: None,
            sources: vec![src],
            tests: Vec::new(),
            classpath: vec![lib],
            test_classpath: Vec::new(),
            output_dir: Some(classes),
            test_output_dir: None,
            packaging: Packaging::Jar,
            modules: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn writes_three_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("out");
        fs::create_dir_all(&work).unwrap();
        let config = config(tmp.path());

        let files = dump_module(&config, &work, None).unwrap();

        assert_eq!(files.libraries, work.join("com.acme-core.lib.list"));
        assert_eq!(
            fs::read_to_string(&files.libraries).unwrap(),
            tmp.path().join("lib.jar").display().to_string()
        );
        assert_eq!(
            fs::read_to_string(&files.class_dirs).unwrap(),
            tmp.path().join("classes").display().to_string()
        );
        assert_eq!(
            fs::read_to_string(&files.source_roots).unwrap(),
            tmp.path().join("src").display().to_string()
        );
    }

    #[test]
    fn module_without_output_dir_dumps_empty_dir_list() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config(tmp.path());
        config.output_dir = None;

        let files = dump_module(&config, tmp.path(), None).unwrap();
        assert_eq!(fs::read_to_string(files.class_dirs).unwrap(), "");
    }

    #[test]
    fn contributes_sources_to_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let list = tmp.path().join("sources.json");
        let mut registry = SourceRegistry::new(&list);

        dump_module(&config, tmp.path(), Some(&mut registry)).unwrap();

        let files: Vec<String> = serde_json::from_str(&fs::read_to_string(&list).unwrap()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.iter().all(|f| f.ends_with("Main.java")));
    }

    #[test]
    fn unwritable_work_dir_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let err = dump_module(&config, &tmp.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, EngineError::WriteList { .. }));
    }
}
