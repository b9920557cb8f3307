//! Per-module configuration: identity, source and test roots, classpath, and
//! output directories derived from a descriptor and the override layers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use xvsa_config::properties::{self, Layer, PropertyLayers};
use xvsa_config::{ModuleDescriptor, Packaging, Reactor};
use xvsa_util::paths;

use crate::error::EngineError;

/// Web asset directory used when the packaging plugin declares none.
const DEFAULT_WEB_SOURCE_DIR: &str = "src/main/webapp";
/// Per-module scratch directory published as `xvsa.workdir`.
const WORK_DIR_NAME: &str = "xvsa-work";

/// Everything the engine knows about one module for the duration of a run.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Module key, possibly namespaced under the project key.
    pub key: String,
    /// `group:artifact` of the descriptor.
    pub artifact_key: String,
    pub version: String,
    pub name: String,
    pub description: Option<String>,
    pub base_dir: PathBuf,
    pub descriptor_file: PathBuf,
    pub build_dir: Option<PathBuf>,
    /// Resolved source roots: absolute, de-duplicated, none nested in another.
    pub sources: Vec<PathBuf>,
    pub tests: Vec<PathBuf>,
    /// Existing main classpath entries, excluding the module's own output.
    pub classpath: Vec<PathBuf>,
    pub test_classpath: Vec<PathBuf>,
    /// Main compiled-class directory; only set when it exists.
    pub output_dir: Option<PathBuf>,
    pub test_output_dir: Option<PathBuf>,
    pub packaging: Packaging,
    /// Declared sub-module paths, relative to `base_dir`.
    pub modules: Vec<String>,
    /// Merged property bag: descriptor < environment < user.
    pub properties: BTreeMap<String, String>,
}

impl ModuleConfig {
    /// Module key with path-unsafe characters replaced, used to name artifacts.
    pub fn sanitized_key(&self) -> String {
        sanitize_key(&self.key)
    }

    /// Flatten into the key/value map published to the host.
    ///
    /// Computed keys are written over the merged property bag.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut props = self.properties.clone();
        let mut put = |key: &str, value: String| {
            props.insert(key.to_owned(), value);
        };

        put(properties::MODULE_KEY, self.key.clone());
        put(properties::PROJECT_VERSION, self.version.clone());
        put(properties::PROJECT_NAME, self.name.clone());
        if let Some(description) = &self.description {
            put(properties::PROJECT_DESCRIPTION, description.clone());
        }
        put(properties::PROJECT_BASEDIR, display(&self.base_dir));
        if let Some(build_dir) = &self.build_dir {
            put(properties::PROJECT_BUILDDIR, display(build_dir));
            put(properties::WORK_DIR, display(&build_dir.join(WORK_DIR_NAME)));
        }
        if let Some(output_dir) = &self.output_dir {
            let value = display(output_dir);
            put(properties::BINARIES, value.clone());
            put(properties::JAVA_BINARIES, value.clone());
            put(properties::GROOVY_BINARIES, value);
        }
        if let Some(test_output_dir) = &self.test_output_dir {
            put(properties::JAVA_TEST_BINARIES, display(test_output_dir));
        }

        let libraries = join(&self.classpath);
        put(properties::LIBRARIES, libraries.clone());
        put(properties::JAVA_LIBRARIES, libraries);
        put(properties::JAVA_TEST_LIBRARIES, join(&self.test_classpath));

        put(properties::PACKAGING, self.packaging.as_str().to_owned());
        put(properties::SOURCES, join(&self.sources));
        if self.tests.is_empty() {
            props.remove(properties::TESTS);
        } else {
            props.insert(properties::TESTS.to_owned(), join(&self.tests));
        }
        props
    }
}

/// Replace characters that cannot appear in an artifact file name.
pub fn sanitize_key(key: &str) -> String {
    key.replace([':', '/', '\\'], "-")
}

/// The project-wide key namespace, taken from the user overrides or the root
/// descriptor. Blank values count as absent.
pub fn project_key_hint(
    user_properties: &BTreeMap<String, String>,
    root: &ModuleDescriptor,
) -> Option<String> {
    user_properties
        .get(properties::PROJECT_KEY)
        .or_else(|| root.properties.get(properties::PROJECT_KEY))
        .filter(|key| !key.is_empty())
        .cloned()
}

/// Build the configuration of every module in the reactor that is not skipped.
///
/// Configurations are returned in reactor order.
///
/// # Errors
/// Returns an error if there is no execution root or any module fails to configure.
pub fn configure_all(reactor: &Reactor) -> Result<Vec<ModuleConfig>, EngineError> {
    let root = reactor.execution_root().ok_or(EngineError::NoExecutionRoot)?;
    let hint = project_key_hint(&reactor.user_properties, root);

    let mut configs = Vec::with_capacity(reactor.modules.len());
    for descriptor in &reactor.modules {
        if descriptor.is_skipped() {
            tracing::debug!(module = %descriptor, "module skipped by property '{}'", properties::SKIP);
            continue;
        }
        configs.push(build(
            descriptor,
            &reactor.environment_properties,
            &reactor.user_properties,
            hint.as_deref(),
        )?);
    }
    Ok(configs)
}

/// Build one module's configuration.
///
/// # Errors
/// Returns an error if a user-declared source or test root does not exist on a
/// non-aggregator module, or if either classpath has not been resolved.
pub fn build(
    descriptor: &ModuleDescriptor,
    env_properties: &BTreeMap<String, String>,
    user_properties: &BTreeMap<String, String>,
    project_key: Option<&str>,
) -> Result<ModuleConfig, EngineError> {
    let layers = PropertyLayers::new()
        .with(Layer::Descriptor, &descriptor.properties)
        .with(Layer::Environment, env_properties)
        .with(Layer::User, user_properties);

    let base_dir = paths::absolute(&descriptor.base_dir);
    let build_dir = paths::resolve(descriptor.build.directory.as_deref(), &base_dir);

    let output_dir = existing_dir(descriptor.build.output_directory.as_deref(), &base_dir);
    let test_output_dir =
        existing_dir(descriptor.build.test_output_directory.as_deref(), &base_dir);

    let classpath = resolve_classpath(
        descriptor,
        descriptor.compile_classpath.as_deref(),
        descriptor.build.output_directory.as_deref(),
        &base_dir,
        "compile",
    )?;
    let test_classpath = resolve_classpath(
        descriptor,
        descriptor.test_classpath.as_deref(),
        descriptor.build.test_output_directory.as_deref(),
        &base_dir,
        "test",
    )?;

    let sources = resolve_roots(
        descriptor,
        &layers,
        properties::SOURCES,
        main_source_candidates(descriptor, &base_dir),
        &base_dir,
        build_dir.as_deref(),
    )?;
    let tests = resolve_roots(
        descriptor,
        &layers,
        properties::TESTS,
        paths::resolve_all(
            descriptor.test_compile_source_roots.iter().map(String::as_str),
            &base_dir,
        ),
        &base_dir,
        build_dir.as_deref(),
    )?;

    Ok(ModuleConfig {
        key: module_key(descriptor, project_key),
        artifact_key: descriptor.artifact_key(),
        version: descriptor.version.clone(),
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        descriptor_file: paths::absolute(&descriptor.descriptor_file()),
        base_dir,
        build_dir,
        sources,
        tests,
        classpath,
        test_classpath,
        output_dir,
        test_output_dir,
        packaging: descriptor.packaging.clone(),
        modules: descriptor.modules.clone(),
        properties: layers.merged(),
    })
}

fn module_key(descriptor: &ModuleDescriptor, project_key: Option<&str>) -> String {
    if let Some(explicit) = descriptor.properties.get(properties::PROJECT_KEY) {
        return explicit.clone();
    }
    match project_key {
        Some(hint) => format!("{hint}:{}", descriptor.artifact_key()),
        None => descriptor.artifact_key(),
    }
}

fn existing_dir(path: Option<&str>, base_dir: &Path) -> Option<PathBuf> {
    paths::resolve(path, base_dir).filter(|p| p.exists())
}

fn resolve_classpath(
    descriptor: &ModuleDescriptor,
    entries: Option<&[String]>,
    own_output: Option<&str>,
    base_dir: &Path,
    scope: &str,
) -> Result<Vec<PathBuf>, EngineError> {
    let Some(entries) = entries else {
        return Err(EngineError::UnresolvedClasspath {
            module: descriptor.to_string(),
            scope: scope.to_owned(),
        });
    };
    let own_output_resolved = paths::resolve(own_output, base_dir);

    let resolved = entries
        .iter()
        .filter(|entry| Some(entry.as_str()) != own_output)
        .filter_map(|entry| paths::resolve(Some(entry.as_str()), base_dir))
        .filter(|entry| Some(entry) != own_output_resolved.as_ref());
    Ok(paths::filter_existing(resolved))
}

/// Default main source candidates in declaration order: the web asset
/// directory for web modules, the descriptor file, then the compile roots
/// (never for aggregators).
fn main_source_candidates(descriptor: &ModuleDescriptor, base_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if descriptor.packaging.is_web() {
        let web = descriptor
            .web_source_dir
            .as_deref()
            .unwrap_or(DEFAULT_WEB_SOURCE_DIR);
        candidates.extend(paths::resolve(Some(web), base_dir));
    }
    candidates.push(paths::absolute(&descriptor.descriptor_file()));
    if !descriptor.packaging.is_aggregator() {
        candidates.extend(paths::resolve_all(
            descriptor.compile_source_roots.iter().map(String::as_str),
            base_dir,
        ));
    }
    dedup_preserving_order(candidates)
}

/// Resolve one root list (`xvsa.sources` or `xvsa.tests`).
///
/// An override from any layer replaces the defaults entirely and bypasses the
/// build-output filter; on buildable modules every overridden entry must exist.
fn resolve_roots(
    descriptor: &ModuleDescriptor,
    layers: &PropertyLayers<'_>,
    key: &str,
    defaults: Vec<PathBuf>,
    base_dir: &Path,
    build_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, EngineError> {
    if let Some((layer, value)) = layers.get_non_empty(key) {
        tracing::debug!(module = %descriptor, ?layer, "{key} overridden: {value}");
        let declared = paths::resolve_all(paths::split_list(value), base_dir);
        if descriptor.packaging.is_aggregator() {
            return Ok(paths::collapse_nested(&paths::filter_existing(declared)));
        }
        if let Some(missing) = declared.iter().find(|p| !p.exists()) {
            return Err(EngineError::MissingSourceDir {
                module: descriptor.to_string(),
                key: key.to_owned(),
                path: missing.clone(),
            });
        }
        return Ok(declared);
    }

    if let Some((layer, _)) = layers.get(key) {
        tracing::debug!(module = %descriptor, ?layer, "{key} is blank, using default roots");
    }

    let candidates = match build_dir {
        Some(build_dir) => paths::remove_under_build_output(defaults, build_dir, base_dir),
        None => defaults,
    };
    Ok(paths::collapse_nested(&paths::filter_existing(candidates)))
}

fn dedup_preserving_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn join(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(&properties::SEPARATOR.to_string())
}
