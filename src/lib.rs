//! Brisk - a YAML-configured task runner
//!
//! Tasks declare typed options whose values are resolved from command-line flags,
//! environment variables, and conditional defaults, then run shell commands
//! interpolated with those values.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use error::{BriskError, Result};

/// Current version of Brisk
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
