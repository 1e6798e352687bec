//! Task execution engine
//!
//! This module resolves option values, orders them by dependency, and runs the
//! commands and subtasks a task is made of.

pub mod command;
pub mod context;
pub mod interpolate;
pub mod option;
pub mod registry;
pub mod task;
pub mod when;

// Re-export main types
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use option::*;
pub use registry::*;
pub use task::*;
pub use when::*;
