//! User-facing terminal output
//!
//! Everything the user is meant to read goes to stderr through a [`Logger`], except
//! the output of the commands themselves, which goes to stdout.

pub mod logger;

pub use logger::*;
