//! Task execution types and logic
//!
//! This module contains the runtime representation of tasks and runs their steps
//! top to bottom. The first failing step aborts the task; `finally` steps always run.

use crate::config;
use crate::error::Result;
use crate::runner::{
    execute_command, interpolate, options_with_order, referenced_variables, Context, TaskArg,
    TaskOption, TaskRegistry, WhenList,
};
use indexmap::IndexMap;

/// Runtime task representation
#[derive(Debug, Clone)]
pub struct Task {
    /// Task name
    pub name: String,

    /// Usage description
    pub usage: Option<String>,

    /// Longer description
    pub description: Option<String>,

    /// Whether this task is hidden from help
    pub private: bool,

    /// Whether commands are run without being printed
    pub quiet: bool,

    /// Positional arguments, in declaration order
    pub args: Vec<TaskArg>,

    /// Named options, in declaration order
    pub options: Vec<TaskOption>,

    /// Run items to execute
    pub run: Vec<Run>,

    /// Finally block
    pub finally: Vec<Run>,
}

impl Task {
    /// Create a new task from validated configuration
    pub fn from_config(name: String, config: config::TaskConfig) -> Self {
        Task {
            usage: config.usage,
            description: config.description,
            private: config.private,
            quiet: config.quiet,
            args: config
                .args
                .into_iter()
                .map(|(k, v)| TaskArg::from_config(k, v))
                .collect(),
            options: options_with_order(config.options),
            run: config.run.into_iter().map(Run::from_config).collect(),
            finally: config.finally.into_iter().map(Run::from_config).collect(),
            name,
        }
    }

    /// Look up one of this task's own options
    pub fn option(&self, name: &str) -> Option<&TaskOption> {
        self.options.iter().find(|opt| opt.name == name)
    }

    /// Look up one of this task's positional arguments
    pub fn arg(&self, name: &str) -> Option<&TaskArg> {
        self.args.iter().find(|arg| arg.name == name)
    }

    /// Whether the task declares an arg or option with this name
    pub fn declares(&self, name: &str) -> bool {
        self.option(name).is_some() || self.arg(name).is_some()
    }

    /// Every variable name the run and finally steps read
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for run in self.run.iter().chain(self.finally.iter()) {
            for name in run.referenced_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Run all steps with an already-resolved context
    pub fn execute(&self, registry: &TaskRegistry, ctx: &mut Context) -> Result<()> {
        ctx.logger.print_task_start(&self.name);

        let result = self
            .run
            .iter()
            .try_for_each(|run| run.execute(self, registry, ctx));

        // Always run finally blocks
        if !self.finally.is_empty() {
            ctx.logger.debug("Running finally block...");
            let finally = self
                .finally
                .iter()
                .try_for_each(|run| run.execute(self, registry, ctx));

            // A failure in the main steps takes precedence
            match (&result, finally) {
                (Ok(()), Err(e)) => return Err(e),
                (Err(_), Err(e)) => {
                    let e = anyhow::Error::from(e);
                    ctx.logger.error(format!("finally block failed: {:#}", e))
                }
                _ => {}
            }
        }

        if result.is_ok() {
            ctx.logger.print_task_complete(&self.name);
        }

        result
    }
}

/// Runtime representation of a run item
#[derive(Debug, Clone, Default)]
pub struct Run {
    /// Conditions that must be met
    pub when: WhenList,

    /// Commands to execute
    pub commands: Vec<Command>,

    /// Subtasks to execute
    pub subtasks: Vec<SubTask>,

    /// Environment variables to set (`None` unsets)
    pub set_environment: IndexMap<String, Option<String>>,
}

impl Run {
    /// Create from config
    pub fn from_config(config: config::RunConfig) -> Self {
        match config {
            config::RunConfig::SimpleCommand(cmd) => Run {
                commands: vec![Command::Simple(cmd)],
                ..Default::default()
            },
            config::RunConfig::Complex(item) => Run {
                when: WhenList::from_config(item.when),
                commands: item.command.into_iter().map(Command::from_config).collect(),
                subtasks: item.task.into_iter().map(SubTask::from_config).collect(),
                set_environment: item
                    .set_environment
                    .into_iter()
                    .map(|(k, v)| (k, v.map(String::from)))
                    .collect(),
            },
        }
    }

    /// Variable names read by this step's guard and interpolated text
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.when.variables().map(str::to_string).collect();

        let texts = self
            .commands
            .iter()
            .flat_map(|cmd| [Some(cmd.exec()), Some(cmd.print()), cmd.dir()])
            .flatten()
            .chain(
                self.subtasks
                    .iter()
                    .flat_map(|st| st.options.values().map(String::as_str)),
            )
            .chain(self.set_environment.values().flatten().map(String::as_str));

        for text in texts {
            names.extend(referenced_variables(text));
        }
        names
    }

    /// Execute this step unless its guard fails
    fn execute(&self, task: &Task, registry: &TaskRegistry, ctx: &mut Context) -> Result<()> {
        if !self.when.is_satisfied(&ctx.vars) {
            ctx.logger.debug("Skipping step: condition not met");
            return Ok(());
        }

        for cmd in &self.commands {
            execute_command(cmd, ctx, task.quiet)?;
        }

        for subtask in &self.subtasks {
            registry.run_subtask(subtask, ctx)?;
        }

        for (key, value) in &self.set_environment {
            match value {
                Some(val) => {
                    let interpolated = interpolate(val, &ctx.vars);
                    std::env::set_var(key, &interpolated);
                    ctx.set_var(key.clone(), interpolated);
                }
                None => {
                    std::env::remove_var(key);
                    ctx.vars.remove(key);
                }
            }
        }

        Ok(())
    }
}

/// Runtime representation of a command
#[derive(Debug, Clone)]
pub enum Command {
    /// Simple command string
    Simple(String),

    /// Complex command with options
    Complex {
        exec: String,
        print: String,
        quiet: bool,
        dir: Option<String>,
    },
}

impl Command {
    /// Create from config
    pub fn from_config(config: config::CommandConfig) -> Self {
        match config {
            config::CommandConfig::Simple(cmd) => Command::Simple(cmd),
            config::CommandConfig::Complex(detail) => Command::Complex {
                print: detail.print.unwrap_or_else(|| detail.exec.clone()),
                exec: detail.exec,
                quiet: detail.quiet,
                dir: detail.dir,
            },
        }
    }

    /// Get the command to execute
    pub fn exec(&self) -> &str {
        match self {
            Command::Simple(cmd) => cmd,
            Command::Complex { exec, .. } => exec,
        }
    }

    /// Get what to print
    pub fn print(&self) -> &str {
        match self {
            Command::Simple(cmd) => cmd,
            Command::Complex { print, .. } => print,
        }
    }

    /// Check if this command is quiet
    pub fn is_quiet(&self) -> bool {
        match self {
            Command::Simple(_) => false,
            Command::Complex { quiet, .. } => *quiet,
        }
    }

    /// Get the working directory
    pub fn dir(&self) -> Option<&str> {
        match self {
            Command::Simple(_) => None,
            Command::Complex { dir, .. } => dir.as_deref(),
        }
    }
}

/// Runtime representation of a subtask reference
#[derive(Debug, Clone)]
pub struct SubTask {
    pub name: String,
    /// Values passed to the subtask's options and arguments, before interpolation
    pub options: IndexMap<String, String>,
}

impl SubTask {
    pub fn from_config(config: config::SubTaskConfig) -> Self {
        match config {
            config::SubTaskConfig::Simple(name) => SubTask {
                name,
                options: IndexMap::new(),
            },
            config::SubTaskConfig::Complex(detail) => SubTask {
                name: detail.name,
                options: detail
                    .options
                    .into_iter()
                    .map(|(k, v)| (k, String::from(v)))
                    .collect(),
            },
        }
    }
}
