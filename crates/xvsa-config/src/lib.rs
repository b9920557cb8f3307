//! Parse the host reactor description, the gather settings, and property override layers.

pub mod properties;
pub mod reactor;
pub mod settings;

pub use properties::{Layer, PropertyLayers};
pub use reactor::{BuildLayout, ModuleDescriptor, Packaging, Reactor};
pub use settings::GatherSettings;
