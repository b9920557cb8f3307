//! Property keys and the ordered override layers that feed a module configuration.

use std::collections::BTreeMap;

/// Project-wide key; descriptor-level value is used verbatim as the module key.
pub const PROJECT_KEY: &str = "xvsa.projectKey";
pub const MODULE_KEY: &str = "xvsa.moduleKey";
pub const PROJECT_VERSION: &str = "xvsa.projectVersion";
pub const PROJECT_NAME: &str = "xvsa.projectName";
pub const PROJECT_DESCRIPTION: &str = "xvsa.projectDescription";
pub const PROJECT_BASEDIR: &str = "xvsa.projectBaseDir";
pub const PROJECT_BUILDDIR: &str = "xvsa.projectBuildDir";
pub const WORK_DIR: &str = "xvsa.workdir";
pub const PACKAGING: &str = "xvsa.packaging";
pub const SKIP: &str = "xvsa.skip";

/// Comma-separated source roots.
pub const SOURCES: &str = "xvsa.sources";
/// Comma-separated test roots.
pub const TESTS: &str = "xvsa.tests";

pub const BINARIES: &str = "xvsa.binaries";
pub const JAVA_BINARIES: &str = "xvsa.java.binaries";
pub const GROOVY_BINARIES: &str = "xvsa.groovy.binaries";
pub const JAVA_TEST_BINARIES: &str = "xvsa.java.test.binaries";

pub const LIBRARIES: &str = "xvsa.libraries";
pub const JAVA_LIBRARIES: &str = "xvsa.java.libraries";
pub const JAVA_TEST_LIBRARIES: &str = "xvsa.java.test.libraries";

/// Separator for list-valued properties.
pub const SEPARATOR: char = ',';

/// Where a property value came from. Later variants take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Descriptor,
    Environment,
    User,
}

/// An ordered stack of property maps, lowest precedence first.
///
/// Layers are kept sorted by [`Layer`] regardless of insertion order, so
/// precedence is a property of the type rather than of the call sequence.
#[derive(Debug, Clone, Default)]
pub struct PropertyLayers<'a> {
    layers: Vec<(Layer, &'a BTreeMap<String, String>)>,
}

impl<'a> PropertyLayers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer. Adding the same layer twice keeps both, in insertion order.
    pub fn with(mut self, layer: Layer, properties: &'a BTreeMap<String, String>) -> Self {
        self.layers.push((layer, properties));
        self.layers.sort_by_key(|(l, _)| *l);
        self
    }

    /// Flatten all layers; the highest-precedence value wins for each key.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for &(_, properties) in &self.layers {
            for (k, v) in properties {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// The highest-precedence value for `key`, with the layer that supplied it.
    pub fn get(&self, key: &str) -> Option<(Layer, &'a str)> {
        self.layers
            .iter()
            .rev()
            .find_map(|&(layer, properties)| properties.get(key).map(|v| (layer, v.as_str())))
    }

    /// Like [`get`](Self::get), but layers holding an empty value are skipped.
    pub fn get_non_empty(&self, key: &str) -> Option<(Layer, &'a str)> {
        self.layers.iter().rev().find_map(|&(layer, properties)| {
            properties
                .get(key)
                .filter(|v| !v.is_empty())
                .map(|v| (layer, v.as_str()))
        })
    }
}
