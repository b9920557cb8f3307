#![forbid(unsafe_code)]
//! Path-set arithmetic, filesystem helpers, and process execution for xvsa-gather.

pub mod error;
pub mod fs;
pub mod paths;
pub mod process;
