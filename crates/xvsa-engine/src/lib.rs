//! Module configuration, source registry, library cache, and the gather walk.

pub mod configure;
pub mod dump;
pub mod error;
pub mod gather;
pub mod library;
pub mod registry;
pub mod walk;

pub use configure::ModuleConfig;
pub use error::EngineError;
pub use gather::{gather, GatherReport, Gatherer, ModuleOutcome, ModuleReport, Step};
