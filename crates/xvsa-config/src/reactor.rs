use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of a module descriptor inside its base directory.
pub const DESCRIPTOR_FILE_NAME: &str = "pom.xml";

/// The build session handed over by the host: every module in the reactor
/// plus the two global override layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reactor {
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    /// Overrides supplied on the command line (`-Dkey=value`). Highest precedence.
    #[serde(default)]
    pub user_properties: BTreeMap<String, String>,
    /// Overrides supplied by the environment.
    #[serde(default)]
    pub environment_properties: BTreeMap<String, String>,
}

/// One module of the build graph, as resolved by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_dir: PathBuf,
    /// Path of the descriptor file; defaults to `<base_dir>/pom.xml`.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub packaging: Packaging,
    /// Sub-module paths, relative to `base_dir`.
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub compile_source_roots: Vec<String>,
    #[serde(default)]
    pub test_compile_source_roots: Vec<String>,
    /// `None` when the host has not resolved dependencies for this module.
    #[serde(default)]
    pub compile_classpath: Option<Vec<String>>,
    #[serde(default)]
    pub test_classpath: Option<Vec<String>>,
    #[serde(default)]
    pub build: BuildLayout,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Web asset directory declared by the packaging plugin, if any.
    #[serde(default)]
    pub web_source_dir: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub execution_root: bool,
}

/// Build output locations. Relative entries are relative to the module base directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildLayout {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub test_output_directory: Option<String>,
}

/// Declared packaging kind of a module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Packaging {
    /// Groups children and is never analyzed itself.
    Pom,
    #[default]
    Jar,
    /// Web-deployable artifact; carries an extra web asset source root.
    War,
    Other(String),
}

impl Packaging {
    pub fn as_str(&self) -> &str {
        match self {
            Packaging::Pom => "pom",
            Packaging::Jar => "jar",
            Packaging::War => "war",
            Packaging::Other(kind) => kind,
        }
    }

    pub fn is_aggregator(&self) -> bool {
        *self == Packaging::Pom
    }

    pub fn is_web(&self) -> bool {
        *self == Packaging::War
    }
}

impl From<String> for Packaging {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "pom" => Packaging::Pom,
            "jar" => Packaging::Jar,
            "war" => Packaging::War,
            _ => Packaging::Other(kind),
        }
    }
}

impl From<Packaging> for String {
    fn from(kind: Packaging) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ModuleDescriptor {
    /// The default identity of a module: `group:artifact`.
    pub fn artifact_key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Absolute path of the descriptor file.
    pub fn descriptor_file(&self) -> PathBuf {
        match &self.file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => self.base_dir.join(file),
            None => self.base_dir.join(DESCRIPTOR_FILE_NAME),
        }
    }

    /// Whether the module opted out through its descriptor flag or `xvsa.skip`.
    pub fn is_skipped(&self) -> bool {
        self.skip
            || self
                .properties
                .get(crate::properties::SKIP)
                .is_some_and(|v| v == "true")
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.packaging, self.version
        )
    }
}

impl Reactor {
    /// Read and parse a reactor description from the given path.
    ///
    /// Files ending in `.toml` are parsed as TOML, anything else as JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, ReactorError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReactorError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        if is_toml {
            toml::from_str(&content).map_err(|e| ReactorError::ParseToml {
                path: path.display().to_string(),
                source: e,
            })
        } else {
            serde_json::from_str(&content).map_err(|e| ReactorError::ParseJson {
                path: path.display().to_string(),
                source: e,
            })
        }
    }

    /// The module the build was started from.
    pub fn execution_root(&self) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.execution_root)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid reactor description at {path}: {source}")]
    ParseJson {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid reactor description at {path}: {source}")]
    ParseToml {
        path: String,
        source: toml::de::Error,
    },
}
