//! Configuration validation
//!
//! All declarative invariants are checked here, once, when the file is loaded.

use crate::config::types::{
    Config, OptionConfig, RunConfig, SubTaskConfig, TaskConfig, ValueConfig,
};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name at least one program".to_string(),
            ));
        }
    }

    for (name, option) in &config.options {
        validate_option(name, option)?;
    }

    // Validate each task
    for (name, task) in &config.tasks {
        validate_task(name, task)?;
    }

    // Check for missing or circular subtask references
    detect_circular_task_dependencies(config)?;

    Ok(())
}

/// Validate a single task
pub fn validate_task(_name: &str, task: &TaskConfig) -> ConfigResult<()> {
    // Check for duplicate names between args and options
    for arg_name in task.args.keys() {
        if task.options.contains_key(arg_name) {
            return Err(ConfigError::DuplicateNames(arg_name.clone()));
        }
    }

    for (opt_name, option) in &task.options {
        validate_option(opt_name, option)?;
    }

    Ok(())
}

/// Validate a single option definition
///
/// Private options may only be satisfied by their own defaults, so they cannot also be
/// required, bound to an environment variable, or restricted to a set of values. A
/// required option cannot carry a default that always applies.
pub fn validate_option(name: &str, option: &OptionConfig) -> ConfigResult<()> {
    if let Some(short) = &option.short {
        if short.chars().count() != 1 {
            return Err(ConfigError::invalid_option(
                name,
                format!("short name '{}' must be exactly one character", short),
            ));
        }
    }

    if option.private && option.required {
        return Err(ConfigError::invalid_option(
            name,
            "private options cannot be required",
        ));
    }

    if option.private && option.environment.is_some() {
        return Err(ConfigError::invalid_option(
            name,
            "private options cannot read from an environment variable",
        ));
    }

    if option.private && !option.values.is_empty() {
        return Err(ConfigError::invalid_option(
            name,
            "private options cannot specify allowed values",
        ));
    }

    if let Some(default) = &option.default {
        let entries = default.clone().into_entries();
        for entry in &entries {
            if let ValueConfig::Entry(entry) = entry {
                match (&entry.value, &entry.command) {
                    (Some(_), Some(_)) => {
                        return Err(ConfigError::invalid_option(
                            name,
                            "a default entry cannot define both value and command",
                        ))
                    }
                    (None, None) => {
                        return Err(ConfigError::invalid_option(
                            name,
                            "a default entry must define a value or a command",
                        ))
                    }
                    _ => {}
                }
            }
        }

        if option.required && has_unconditional_default(&entries) {
            return Err(ConfigError::invalid_option(
                name,
                "required options cannot have an unconditional default",
            ));
        }
    }

    Ok(())
}

fn has_unconditional_default(entries: &[ValueConfig]) -> bool {
    entries.iter().any(|entry| match entry {
        ValueConfig::Literal(_) => true,
        ValueConfig::Entry(entry) => entry.when.is_empty(),
    })
}

/// Detect circular dependencies in task subtask relationships
fn detect_circular_task_dependencies(config: &Config) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for task_name in config.tasks.keys() {
        let mut stack = Vec::new();
        check_task_cycle(config, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Names of every task referenced by a task's run and finally steps
pub fn subtask_names(task: &TaskConfig) -> Vec<&str> {
    task.run
        .iter()
        .chain(task.finally.iter())
        .filter_map(|run| match run {
            RunConfig::SimpleCommand(_) => None,
            RunConfig::Complex(item) => Some(item.task.iter()),
        })
        .flatten()
        .map(|st| match st {
            SubTaskConfig::Simple(name) => name.as_str(),
            SubTaskConfig::Complex(detail) => detail.name.as_str(),
        })
        .collect()
}

/// Recursively check for cycles in task dependencies
fn check_task_cycle(
    config: &Config,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    // Check if we've found a cycle
    if stack.iter().any(|t| t == task_name) {
        stack.push(task_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    // Skip if already fully processed
    if visited.contains(task_name) {
        return Ok(());
    }

    let task = config
        .tasks
        .get(task_name)
        .ok_or_else(|| ConfigError::TaskNotFound(task_name.to_string()))?;

    stack.push(task_name.to_string());

    for subtask_name in subtask_names(task) {
        check_task_cycle(config, subtask_name, visited, stack)?;
    }

    // Remove from stack and mark as visited
    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ArgConfig, RunItem, Scalar};

    fn parse_option(yaml: &str) -> OptionConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn task_running(subtasks: &[&str]) -> TaskConfig {
        TaskConfig {
            run: vec![RunConfig::Complex(RunItem {
                task: subtasks
                    .iter()
                    .map(|name| SubTaskConfig::Simple(name.to_string()))
                    .collect(),
                ..Default::default()
            })],
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_option_definitions() {
        let cases = [
            ("short name exceeds one character", "{short: foo}"),
            ("private and required defined", "{private: true, required: true}"),
            ("private and environment defined", "{private: true, environment: ENV_VAR}"),
            ("private and values defined", "{private: true, values: [foo, bar]}"),
            ("required and default defined", "{required: true, default: foo}"),
            (
                "required and unconditional list default",
                "{required: true, default: [{value: foo}]}",
            ),
            ("entry with value and command", "{default: [{value: a, command: echo b}]}"),
            ("entry with neither value nor command", "{default: [{when: {equal: {a: b}}}]}"),
            ("required and single command default", "{required: true, default: {command: pwd}}"),
        ];

        for (desc, input) in cases {
            let result = validate_option("opt", &parse_option(input));
            assert!(
                matches!(result, Err(ConfigError::InvalidOption { .. })),
                "expected error for {}: {}",
                desc,
                input
            );
        }
    }

    #[test]
    fn test_valid_option_definitions() {
        let cases = [
            "{usage: foo, values: [foo, bar]}",
            "{short: f, environment: FOO}",
            "{private: true, default: bar}",
            "{required: true, default: [{when: {equal: {os: linux}}, value: apt}]}",
            "{default: {command: git rev-parse HEAD}}",
        ];

        for input in cases {
            assert!(validate_option("opt", &parse_option(input)).is_ok(), "{}", input);
        }
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut task = TaskConfig::default();
        task.args.insert("name".to_string(), ArgConfig::default());
        task.options
            .insert("name".to_string(), OptionConfig::default());

        let mut config = Config::default();
        config.tasks.insert("test".to_string(), task);

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateNames(_))));
    }

    #[test]
    fn test_detect_circular_dependency() {
        let mut config = Config::default();
        config.tasks.insert("a".to_string(), task_running(&["b"]));
        config.tasks.insert("b".to_string(), task_running(&["a"]));

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::CircularDependency(_))));
    }

    #[test]
    fn test_detect_missing_subtask() {
        let mut config = Config::default();
        config.tasks.insert("a".to_string(), task_running(&["ghost"]));

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::TaskNotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_global_options_are_validated() {
        let mut config = Config::default();
        config.options.insert(
            "secret".to_string(),
            OptionConfig {
                private: true,
                values: vec![Scalar::from("a")],
                ..Default::default()
            },
        );

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_valid_config() {
        let mut config = Config {
            name: Some("test-app".to_string()),
            usage: Some("Test application".to_string()),
            ..Default::default()
        };
        config.tasks.insert(
            "test".to_string(),
            TaskConfig {
                usage: Some("Test task".to_string()),
                run: vec![RunConfig::SimpleCommand("echo test".to_string())],
                ..Default::default()
            },
        );
        config.tasks.insert("all".to_string(), task_running(&["test", "test"]));

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_interpreter_rejected() {
        let config = Config {
            interpreter: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
    }
}
