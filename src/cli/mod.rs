//! CLI interface and argument parsing
//!
//! This module builds the command-line surface from the loaded config, including
//! the flags synthesized for each task's options, and dispatches to the runner.

pub mod app;
pub mod flag;

// Re-export main types
pub use app::*;
pub use flag::*;
