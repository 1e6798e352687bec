//! Options and their value resolution
//!
//! An option's value comes from the first source that provides one: an explicitly
//! passed value, the bound environment variable, the first default whose condition
//! holds, and finally the zero value of its type.

use crate::config::{self, DefaultConfig, ValueConfig};
use crate::error::{ResolveError, ResolveResult};
use crate::runner::{capture_output, Context, WhenList};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::env;

/// Option value types recognised from the free-form `type` hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    String,
    Bool,
    Integer,
    Float,
}

impl OptionType {
    /// Parse a type hint case-insensitively; `None` for unrecognised hints
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.to_lowercase().as_str() {
            "" | "string" => Some(OptionType::String),
            "bool" | "boolean" => Some(OptionType::Bool),
            "int" | "integer" => Some(OptionType::Integer),
            "float" | "float64" | "double" => Some(OptionType::Float),
            _ => None,
        }
    }

    /// Value used when no source provides one
    pub fn zero_value(self) -> &'static str {
        match self {
            OptionType::Integer | OptionType::Float => "0",
            OptionType::Bool => "false",
            OptionType::String => "",
        }
    }
}

/// Where a default entry gets its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSource {
    Value(String),
    /// Shell command whose output becomes the value
    Command(String),
}

/// One candidate default, applied when its condition holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    pub when: WhenList,
    pub source: DefaultSource,
}

impl DefaultValue {
    pub fn value(value: impl Into<String>) -> Self {
        DefaultValue {
            when: WhenList::default(),
            source: DefaultSource::Value(value.into()),
        }
    }

    pub fn command(command: impl Into<String>) -> Self {
        DefaultValue {
            when: WhenList::default(),
            source: DefaultSource::Command(command.into()),
        }
    }

    pub fn when(mut self, when: WhenList) -> Self {
        self.when = when;
        self
    }

    fn from_config(config: ValueConfig) -> Self {
        match config {
            ValueConfig::Literal(value) => DefaultValue::value(value),
            ValueConfig::Entry(entry) => {
                // Schema validation guarantees exactly one of value and command
                let source = match (entry.value, entry.command) {
                    (_, Some(command)) => DefaultSource::Command(command),
                    (value, None) => DefaultSource::Value(value.map(String::from).unwrap_or_default()),
                };
                DefaultValue {
                    when: WhenList::from_config(entry.when),
                    source,
                }
            }
        }
    }
}

/// Runtime representation of an option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOption {
    pub name: String,
    pub usage: Option<String>,
    pub short: Option<char>,
    /// Free-form type hint as written in the config
    pub option_type: String,
    pub values_allowed: Vec<String>,
    pub required: bool,
    pub private: bool,
    pub environment: Option<String>,
    pub default_values: Vec<DefaultValue>,
}

impl TaskOption {
    pub fn new(name: impl Into<String>) -> Self {
        TaskOption {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build from an already validated config entry
    pub fn from_config(name: String, config: config::OptionConfig) -> Self {
        let default_values = config
            .default
            .map(DefaultConfig::into_entries)
            .unwrap_or_default()
            .into_iter()
            .map(DefaultValue::from_config)
            .collect();

        TaskOption {
            name,
            usage: config.usage,
            short: config.short.and_then(|s| s.chars().next()),
            option_type: config.option_type,
            values_allowed: config.values.into_iter().map(String::from).collect(),
            required: config.required,
            private: config.private,
            environment: config.environment,
            default_values,
        }
    }

    /// Recognised type, or `None` for a hint no flag can be built for
    pub fn kind(&self) -> Option<OptionType> {
        OptionType::from_hint(&self.option_type)
    }

    /// Every variable named by any default entry's condition, deduplicated
    pub fn dependencies(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.default_values
            .iter()
            .flat_map(|default| default.when.variables())
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// Resolve this option's value in the given context
    ///
    /// Defaults are never checked against the allowed values; only passed and
    /// environment values are.
    pub fn evaluate(&self, ctx: &Context) -> ResolveResult<String> {
        let value = match self.explicit_value(ctx)? {
            Some(value) => value,
            None => match self.default_value(ctx)? {
                Some(value) => value,
                None => self.type_fallback().to_string(),
            },
        };

        if self.required && value.is_empty() {
            return Err(ResolveError::Required {
                option: self.name.clone(),
            });
        }

        Ok(value)
    }

    /// Value from the command line or the environment, validated
    fn explicit_value(&self, ctx: &Context) -> ResolveResult<Option<String>> {
        if self.private {
            return Ok(None);
        }

        if let Some(passed) = ctx.passed_value(&self.name) {
            tracing::debug!(option = %self.name, "using passed value");
            return self.validate(passed).map(Some);
        }

        if let Some(var) = &self.environment {
            if let Ok(value) = env::var(var) {
                tracing::debug!(option = %self.name, env = %var, "using environment value");
                return self.validate(&value).map(Some);
            }
        }

        Ok(None)
    }

    /// First default whose condition holds, running its command if it has one
    fn default_value(&self, ctx: &Context) -> ResolveResult<Option<String>> {
        let Some(default) = self
            .default_values
            .iter()
            .find(|default| default.when.is_satisfied(&ctx.vars))
        else {
            return Ok(None);
        };

        match &default.source {
            DefaultSource::Value(value) => Ok(Some(value.clone())),
            DefaultSource::Command(command) => {
                tracing::debug!(option = %self.name, command = %command, "running default command");
                let output = capture_output(command, ctx).map_err(|source| ResolveError::Command {
                    option: self.name.clone(),
                    source,
                })?;
                Ok(Some(output))
            }
        }
    }

    fn type_fallback(&self) -> &'static str {
        self.kind().map(OptionType::zero_value).unwrap_or("")
    }

    fn validate(&self, value: &str) -> ResolveResult<String> {
        validate_allowed(&self.name, value, &self.values_allowed)
    }

    /// Default shown in help: the literal a zero-context evaluation would pick
    ///
    /// Command defaults are not run while building help, so they preview as nothing.
    pub fn default_preview(&self) -> Option<String> {
        let default = self
            .default_values
            .iter()
            .find(|default| default.when.is_satisfied(&Default::default()))?;

        match &default.source {
            DefaultSource::Value(value) if !value.is_empty() => Some(value.clone()),
            _ => None,
        }
    }
}

/// Check a value against a list of allowed values; an empty list allows anything
pub fn validate_allowed(name: &str, value: &str, allowed: &[String]) -> ResolveResult<String> {
    if allowed.is_empty() || allowed.iter().any(|v| v == value) {
        Ok(value.to_string())
    } else {
        Err(ResolveError::InvalidValue {
            option: name.to_string(),
            value: value.to_string(),
            allowed: allowed.to_vec(),
        })
    }
}

/// Turn an ordered option mapping into options named by their keys, keeping order
pub fn options_with_order(options: IndexMap<String, config::OptionConfig>) -> Vec<TaskOption> {
    options
        .into_iter()
        .map(|(name, option)| TaskOption::from_config(name, option))
        .collect()
}

/// Runtime representation of a positional argument
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArg {
    pub name: String,
    pub usage: Option<String>,
    pub default: Option<String>,
    pub required: bool,
    pub values_allowed: Vec<String>,
}

impl TaskArg {
    pub fn from_config(name: String, config: config::ArgConfig) -> Self {
        let default: Option<String> = config.default.map(String::from);
        TaskArg {
            name,
            usage: config.usage,
            required: config.required.unwrap_or(default.is_none()),
            default,
            values_allowed: config.values.into_iter().map(String::from).collect(),
        }
    }

    /// Resolve from a passed value or the declared default
    pub fn evaluate(&self, ctx: &Context) -> ResolveResult<String> {
        if let Some(passed) = ctx.passed_value(&self.name) {
            return validate_allowed(&self.name, passed, &self.values_allowed);
        }

        match &self.default {
            Some(default) => Ok(default.clone()),
            None if self.required => Err(ResolveError::Required {
                option: self.name.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}
