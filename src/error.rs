//! Error types for Brisk

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for Brisk operations
pub type Result<T> = std::result::Result<T, BriskError>;

/// Main error type for Brisk
#[derive(Error, Debug)]
pub enum BriskError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Option resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Task execution errors
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Errors attaching synthesized flags to the CLI
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// I/O errors
    #[error("I/O error")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("Argument and option '{0}' must have unique names within a task")]
    DuplicateNames(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Circular option reference detected: {0}")]
    CircularOption(String),

    #[error("Failed to load env file '{path}': {error}")]
    EnvFile { path: PathBuf, error: String },
}

/// Errors raised while resolving an option or argument value
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no value was provided for required option '{option}'")]
    Required { option: String },

    #[error("value '{value}' for option '{option}' must be one of: {}", allowed.join(", "))]
    InvalidValue {
        option: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("could not compute default for option '{option}'")]
    Command {
        option: String,
        #[source]
        source: ExecutionError,
    },
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to launch `{command}`")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("failed to open output pipe")]
    Pipe(#[source] io::Error),

    #[error("Task '{0}' invoked itself recursively")]
    Recursion(String),
}

/// Errors attaching a synthesized flag to a command
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("could not add flag '{option}' to command '{task}': {problem}")]
    Attach {
        option: String,
        task: String,
        problem: FlagProblem,
    },

    #[error("could not collect options for task '{task}'")]
    Closure {
        task: String,
        #[source]
        source: ConfigError,
    },
}

/// Why a single flag could not be constructed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagProblem {
    #[error("unsupported option type '{0}'")]
    UnsupportedType(String),

    #[error("'{0}' is reserved for a global flag")]
    Reserved(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for option resolution
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

impl ConfigError {
    /// Schema violation on a named option
    pub fn invalid_option(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
