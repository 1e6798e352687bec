//! Core configuration types
//!
//! This module defines the data structures that represent a brisk.yml configuration file.
//! Maps use `IndexMap` because declaration order is observable: flags are listed and
//! options are resolved in the order they are written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Options shared by every task that references them
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, OptionConfig>,

    /// Tasks defined in the configuration
    #[serde(default)]
    pub tasks: IndexMap<String, TaskConfig>,

    /// Global interpreter to use for commands (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Environment files to load before resolving options
    #[serde(rename = "env-file", default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<Vec<String>>,
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Usage description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Longer description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether this task is private (hidden from help)
    #[serde(default)]
    pub private: bool,

    /// Whether this task should run quietly
    #[serde(default)]
    pub quiet: bool,

    /// Positional arguments for the task
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, ArgConfig>,

    /// Named options (flags) for the task
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, OptionConfig>,

    /// Run items to execute
    #[serde(default, deserialize_with = "deserialize_run_items")]
    pub run: Vec<RunConfig>,

    /// Finally block - always executes, even on error
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_run_items"
    )]
    pub finally: Vec<RunConfig>,
}

/// A run item - can be a command or a complex step
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RunConfig {
    /// Simple string command
    SimpleCommand(String),

    /// Complex run item with conditionals and multiple actions
    Complex(RunItem),
}

/// A complex run item with conditions and actions
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunItem {
    /// Conditions that must be met for this run item to execute
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_when_list"
    )]
    pub when: Vec<WhenConfig>,

    /// Commands to execute
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_commands"
    )]
    pub command: Vec<CommandConfig>,

    /// Subtasks to execute
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_subtasks"
    )]
    pub task: Vec<SubTaskConfig>,

    /// Environment variables to set (null unsets)
    #[serde(
        rename = "set-environment",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub set_environment: IndexMap<String, Option<Scalar>>,
}

/// A command to execute
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Simple string command
    Simple(String),

    /// Complex command with additional options
    Complex(CommandDetail),
}

/// Detailed command specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDetail {
    /// The command to execute
    pub exec: String,

    /// What to print when running (defaults to exec)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print: Option<String>,

    /// Whether to suppress printing the command
    #[serde(default)]
    pub quiet: bool,

    /// Working directory for the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// A reference to a subtask to execute
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubTaskConfig {
    /// Simple task name
    Simple(String),

    /// Complex subtask with options
    Complex(SubTaskDetail),
}

/// Detailed subtask specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SubTaskDetail {
    /// Name of the task to run
    pub name: String,

    /// Option and argument values to pass to the subtask
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, Scalar>,
}

/// A conditional expression
///
/// Either the shorthand `name`, which holds when the variable equals `"true"`,
/// or a set of equality clauses that must all hold.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WhenConfig {
    /// Shorthand for `equal: {name: "true"}`
    Shorthand(String),

    /// Explicit clauses
    Clauses(WhenClauses),
}

/// Equality clauses of a single when
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhenClauses {
    /// Variables that must equal the given literal
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub equal: IndexMap<String, Scalar>,

    /// Variables that must differ from the given literal
    #[serde(rename = "not-equal", default, skip_serializing_if = "IndexMap::is_empty")]
    pub not_equal: IndexMap<String, Scalar>,
}

/// An option (flag) definition
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OptionConfig {
    /// Usage description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Short flag (single character)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Option type hint (string, bool, integer, float, ...)
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub option_type: String,

    /// Default value, or an ordered list of candidate defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultConfig>,

    /// Required option
    #[serde(default)]
    pub required: bool,

    /// Environment variable to read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Private option (never exposed as a flag)
    #[serde(default)]
    pub private: bool,

    /// Permitted values, empty means unrestricted
    #[serde(rename = "values", default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Scalar>,
}

/// The `default` key of an option
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DefaultConfig {
    /// A single unconditional literal
    Single(Scalar),

    /// A single entry, e.g. `default: {command: git rev-parse HEAD}`
    Entry(ValueEntry),

    /// Candidate entries evaluated in order
    List(Vec<ValueConfig>),
}

impl DefaultConfig {
    /// The candidate entries in evaluation order
    pub fn into_entries(self) -> Vec<ValueConfig> {
        match self {
            DefaultConfig::Single(value) => vec![ValueConfig::Literal(value)],
            DefaultConfig::Entry(entry) => vec![ValueConfig::Entry(entry)],
            DefaultConfig::List(entries) => entries,
        }
    }
}

/// One candidate default value
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ValueConfig {
    /// An unconditional literal
    Literal(Scalar),

    /// A possibly conditional literal or command
    Entry(ValueEntry),
}

/// A default entry with an optional condition
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValueEntry {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_when_list"
    )]
    pub when: Vec<WhenConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// An argument (positional parameter) definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArgConfig {
    /// Usage description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Scalar>,

    /// Required argument (defaults to true when no default is given)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Permitted values, empty means unrestricted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Scalar>,
}

/// A YAML scalar read as a string, so `default: true` and `default: 5` work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "String")]
pub struct Scalar(pub String);

impl TryFrom<Value> for Scalar {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Scalar(s)),
            Value::Bool(b) => Ok(Scalar(b.to_string())),
            Value::Number(n) => Ok(Scalar(n.to_string())),
            Value::Null => Ok(Scalar(String::new())),
            _ => Err("expected a string, number, or boolean".to_string()),
        }
    }
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        scalar.0
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar(s.to_string())
    }
}

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Custom deserializer for run items that handles both single values and arrays
fn deserialize_run_items<'de, D>(deserializer: D) -> Result<Vec<RunConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single string command
        Value::String(s) => Ok(vec![RunConfig::SimpleCommand(s)]),
        Value::Mapping(_) => {
            let run = RunConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![run])
        }
        // Array of run items
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| RunConfig::deserialize(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("run must be a string, object, or array")),
    }
}

/// Custom deserializer for when lists: a single when, or an array of them
fn deserialize_when_list<'de, D>(deserializer: D) -> Result<Vec<WhenConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(_) | Value::Mapping(_) => {
            let when = WhenConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![when])
        }
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| WhenConfig::deserialize(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("when must be a string, object, or array")),
    }
}

/// Custom deserializer for commands that handles both single values and arrays
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<CommandConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single string or complex command
        Value::String(s) => Ok(vec![CommandConfig::Simple(s)]),
        Value::Mapping(_) => {
            let cmd = CommandConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![cmd])
        }
        // Array of commands
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| CommandConfig::deserialize(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("command must be a string, object, or array")),
    }
}

/// Custom deserializer for subtasks that handles both single values and arrays
fn deserialize_subtasks<'de, D>(deserializer: D) -> Result<Vec<SubTaskConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single string or complex subtask
        Value::String(s) => Ok(vec![SubTaskConfig::Simple(s)]),
        Value::Mapping(_) => {
            let task = SubTaskConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![task])
        }
        // Array of subtasks
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| SubTaskConfig::deserialize(item).map_err(D::Error::custom))
            .collect(),
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("task must be a string, object, or array")),
    }
}
