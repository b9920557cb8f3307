use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tool-chain and run options read from `xvsa.toml`.
///
/// Every field has a default so a partial (or absent) file is valid; the CLI
/// layers its own flags on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherSettings {
    /// Installation directory of the analysis tool chain.
    pub install_dir: Option<PathBuf>,
    /// Tolerate references to classes missing from the classpath.
    pub phantom_refs: bool,
    /// Run the analyzer after a successful front-end translation.
    pub run_analysis: bool,
    /// Runtime library object appended to analyzer invocations when it exists.
    pub runtime_path: Option<PathBuf>,
    /// Generate per-library v-table artifacts.
    pub lib_generation: bool,
    /// File-name prefixes matched against classpath entries.
    pub lib_jar_filter: Vec<String>,
    /// `true`: matching entries are excluded. `false`: only matching entries are included.
    pub lib_jar_blacklist: bool,
    /// Class-name filters forwarded to library generation.
    pub lib_class_filter: Vec<String>,
    pub lib_class_blacklist: bool,
    /// Shared source registry file (JSON array of absolute source paths).
    pub source_list: Option<PathBuf>,
    /// Ask the analyzer for JSON output.
    pub json: bool,
    /// Common working directory for all modules; defaults to `<build>/xvsa-out`.
    pub result_dir: Option<PathBuf>,
    /// Extra analyzer flags.
    pub analysis_opts: Vec<String>,
    /// Extra front-end flags.
    pub front_end_opts: Vec<String>,
    /// Downgrade tool failures to warnings.
    pub ignore_errors: bool,
    /// Only dump module information, never invoke the front end.
    pub skip_front_end: bool,
}

impl Default for GatherSettings {
    fn default() -> Self {
        Self {
            install_dir: None,
            phantom_refs: true,
            run_analysis: false,
            runtime_path: None,
            lib_generation: false,
            lib_jar_filter: Vec::new(),
            lib_jar_blacklist: true,
            lib_class_filter: Vec::new(),
            lib_class_blacklist: true,
            source_list: None,
            json: false,
            result_dir: None,
            analysis_opts: Vec::new(),
            front_end_opts: Vec::new(),
            ignore_errors: false,
            skip_front_end: false,
        }
    }
}

impl GatherSettings {
    /// Read and parse an `xvsa.toml` from the given path.
    /// Returns default settings if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid xvsa.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_when_absent() {
        let settings = GatherSettings::from_path(Path::new("/nonexistent/xvsa.toml"))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(settings, GatherSettings::default());
        assert!(settings.phantom_refs);
        assert!(settings.lib_jar_blacklist);
        assert!(!settings.run_analysis);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = tmp.path().join("xvsa.toml");
        fs::write(
            &path,
            r#"
install_dir = "/opt/xvsa"
run_analysis = true
lib_jar_filter = ["commons-", "guava"]
lib_jar_blacklist = false
"#,
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let settings = GatherSettings::from_path(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(settings.install_dir, Some(PathBuf::from("/opt/xvsa")));
        assert!(settings.run_analysis);
        assert_eq!(settings.lib_jar_filter, vec!["commons-", "guava"]);
        assert!(!settings.lib_jar_blacklist);
        assert!(settings.phantom_refs);
        assert!(settings.lib_class_blacklist);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = tmp.path().join("xvsa.toml");
        fs::write(&path, "run_analysis = maybe").unwrap_or_else(|e| panic!("{e}"));
        let err = GatherSettings::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("invalid xvsa.toml"));
    }
}
