//! Locating, parameterizing, and running the external front end and analyzer.

pub mod detect;
pub mod error;
pub mod invoke;
pub mod runner;

pub use detect::ToolchainLayout;
pub use error::ToolError;
pub use invoke::{AnalyzeCommand, CommonOptions, FrontEndCommand, LibraryCommand};
pub use runner::{ProcessRunner, ToolRun, ToolRunner};
