//! Command-line flags synthesized from task options
//!
//! Every non-private option in a task's closure becomes a `--name` flag on that task's
//! subcommand. Flags are built once on a throwaway command tree and then copied onto
//! the real one by matching subcommand names.

use crate::error::{FlagError, FlagProblem};
use crate::runner::{OptionType, Task, TaskOption, TaskRegistry};
use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashMap;

/// Long names taken by the global flags
pub const RESERVED_NAMES: &[&str] = &[
    "file",
    "quiet",
    "silent",
    "verbose",
    "help",
    "version",
    "completion",
];

/// Short names taken by the global flags
pub const RESERVED_SHORTS: &[char] = &['f', 'q', 's', 'v', 'h', 'V'];

/// Build the flag for one option
pub fn create_flag(option: &TaskOption) -> Result<Arg, FlagProblem> {
    let kind = option
        .kind()
        .ok_or_else(|| FlagProblem::UnsupportedType(option.option_type.clone()))?;

    if RESERVED_NAMES.contains(&option.name.as_str()) {
        return Err(FlagProblem::Reserved(option.name.clone()));
    }

    let mut arg = Arg::new(option.name.clone())
        .long(option.name.clone())
        .help(help_text(option));

    if let Some(short) = option.short {
        if RESERVED_SHORTS.contains(&short) {
            return Err(FlagProblem::Reserved(format!("-{}", short)));
        }
        arg = arg.short(short);
    }

    let arg = match kind {
        // `--name` alone passes "true"; `--name=false` overrides a true default
        OptionType::Bool => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(PossibleValuesParser::new(["true", "false"])),
        _ => {
            let arg = arg
                .action(ArgAction::Set)
                .value_name(option.name.to_uppercase());

            if !option.values_allowed.is_empty() {
                arg.value_parser(PossibleValuesParser::new(option.values_allowed.clone()))
            } else {
                match kind {
                    OptionType::Integer => arg
                        .allow_negative_numbers(true)
                        .value_parser(parse_integer),
                    OptionType::Float => arg
                        .allow_negative_numbers(true)
                        .value_parser(parse_float),
                    _ => arg,
                }
            }
        }
    };

    Ok(arg)
}

/// Usage text with the default and environment binding appended
fn help_text(option: &TaskOption) -> String {
    let mut help = option.usage.clone().unwrap_or_default();

    if let Some(default) = option.default_preview() {
        help.push_str(&format!(" [default: {}]", default));
    }
    if let Some(var) = &option.environment {
        help.push_str(&format!(" [env: {}]", var));
    }

    help.trim_start().to_string()
}

fn parse_integer(value: &str) -> Result<String, String> {
    value
        .parse::<i64>()
        .map(|_| value.to_string())
        .map_err(|_| format!("'{}' is not an integer", value))
}

fn parse_float(value: &str) -> Result<String, String> {
    value
        .parse::<f64>()
        .map(|_| value.to_string())
        .map_err(|_| format!("'{}' is not a number", value))
}

/// Attach an option's flag to `command`
///
/// An option whose name already has a flag on the command is skipped, so the first
/// registration wins. A short already taken on the command is dropped.
pub fn add_flag(command: Command, option: &TaskOption) -> Result<Command, FlagProblem> {
    if command.get_arguments().any(|arg| arg.get_id() == option.name.as_str()) {
        return Ok(command);
    }

    let mut arg = create_flag(option)?;

    if let Some(short) = option.short {
        if command.get_arguments().any(|a| a.get_short() == Some(short)) {
            tracing::warn!(
                option = %option.name,
                command = %command.get_name(),
                "short flag -{} is already taken; dropping it",
                short
            );
            arg = arg.short(None);
        }
    }

    Ok(command.arg(arg))
}

/// Attach flags for every non-private option in a task's closure
pub fn add_task_flags(
    mut command: Command,
    registry: &TaskRegistry,
    task: &Task,
) -> Result<Command, FlagError> {
    let options = registry
        .find_all_options(task)
        .map_err(|source| FlagError::Closure {
            task: task.name.clone(),
            source,
        })?;

    for option in options.into_iter().filter(|opt| !opt.private) {
        command = add_flag(command, option).map_err(|problem| FlagError::Attach {
            option: option.name.clone(),
            task: task.name.clone(),
            problem,
        })?;
    }

    Ok(command)
}

/// A command tree holding one subcommand per task with only its option flags
pub fn flag_app(registry: &TaskRegistry) -> Result<Command, FlagError> {
    registry
        .tasks
        .values()
        .try_fold(Command::new("flags"), |app, task| {
            let sub = add_task_flags(Command::new(task.name.clone()), registry, task)?;
            Ok::<_, FlagError>(app.subcommand(sub))
        })
}

/// Copy flags from `source`'s subcommands onto `target`'s subcommands of the same name
///
/// Arguments already present on the target subcommand are left alone.
pub fn copy_flags(mut target: Command, source: &Command) -> Command {
    for source_sub in source.get_subcommands() {
        let name = source_sub.get_name();
        if target.find_subcommand(name).is_none() {
            continue;
        }

        target = target.mut_subcommand(name, |mut sub| {
            for arg in source_sub.get_arguments() {
                if sub.get_arguments().all(|a| a.get_id() != arg.get_id()) {
                    sub = sub.arg(arg.clone());
                }
            }
            sub
        });
    }

    target
}

/// Values given on the command line for a task's args and option flags
///
/// Flags that were not given are left out so the other sources still apply.
pub fn passed_values(
    matches: &ArgMatches,
    task: &Task,
    options: &[&TaskOption],
) -> HashMap<String, String> {
    let names = task
        .args
        .iter()
        .map(|arg| arg.name.as_str())
        .chain(options.iter().filter(|opt| !opt.private).map(|opt| opt.name.as_str()));

    names
        .filter_map(|name| matched_value(matches, name).map(|value| (name.to_string(), value)))
        .collect()
}

fn matched_value(matches: &ArgMatches, name: &str) -> Option<String> {
    if matches.value_source(name) != Some(ValueSource::CommandLine) {
        return None;
    }

    matches.try_get_one::<String>(name).ok().flatten().cloned()
}
