//! Task lookup, option closure, and invocation
//!
//! The registry owns every task and global option from a loaded config. Before a task
//! runs, the options it needs are collected into a closure ordered so that every option
//! is resolved after the options its conditional defaults read.

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult, ExecutionError, Result};
use crate::runner::{interpolate, options_with_order, Context, SubTask, Task, TaskOption};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Traversal state for one option during closure building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// All tasks and global options from one config file
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    /// Application name shown in help
    pub name: Option<String>,

    /// Application usage shown in help
    pub usage: Option<String>,

    /// Options declared at the top level
    pub options: Vec<TaskOption>,

    /// Tasks, in declaration order
    pub tasks: IndexMap<String, Task>,

    /// Interpreter argv prefix from the config, if any
    pub interpreter: Option<Vec<String>>,
}

impl TaskRegistry {
    /// Build from a config already checked by [`crate::config::parse_config`]
    ///
    /// Every task's option closure is computed here, so option cycles are reported at
    /// load time rather than when the task runs.
    pub fn from_config(config: Config) -> ConfigResult<Self> {
        let tasks = config
            .tasks
            .into_iter()
            .map(|(name, task)| (name.clone(), Task::from_config(name, task)))
            .collect();

        let registry = TaskRegistry {
            name: config.name,
            usage: config.usage,
            options: options_with_order(config.options),
            tasks,
            interpreter: config.interpreter,
        };

        for task in registry.tasks.values() {
            registry.find_all_options(task)?;
        }

        Ok(registry)
    }

    /// Look up a task by name
    pub fn task(&self, name: &str) -> ConfigResult<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))
    }

    /// Look up a global option by name
    pub fn global_option(&self, name: &str) -> Option<&TaskOption> {
        self.options.iter().find(|opt| opt.name == name)
    }

    /// Task options, then global options, by name; task args hide both
    fn lookup<'a>(&'a self, task: &'a Task, name: &str) -> Option<&'a TaskOption> {
        if task.arg(name).is_some() {
            return None;
        }
        task.option(name).or_else(|| self.global_option(name))
    }

    /// Global options a task reads from its run steps, minus those it shadows
    pub fn referenced_globals<'a>(&'a self, task: &'a Task) -> Vec<&'a TaskOption> {
        let referenced = task.referenced_names();
        self.options
            .iter()
            .filter(|opt| referenced.contains(&opt.name) && !task.declares(&opt.name))
            .collect()
    }

    /// The options a task depends on
    ///
    /// Starts from the task's own options and the global options its run steps
    /// reference, then follows every name a conditional default reads. Names that are
    /// not options (arguments, plain environment variables) end the walk. The result
    /// lists each option once, after all of its dependencies.
    pub fn find_all_options<'a>(&'a self, task: &'a Task) -> ConfigResult<Vec<&'a TaskOption>> {
        let roots = task.options.iter().chain(self.referenced_globals(task));

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        let mut ordered: Vec<&TaskOption> = Vec::new();

        for root in roots {
            self.visit(task, root, &mut marks, &mut path, &mut ordered)?;
        }

        Ok(ordered)
    }

    /// The direct dependencies of `option` that are themselves options
    pub fn dependencies<'a>(&'a self, task: &'a Task, option: &TaskOption) -> Vec<&'a TaskOption> {
        option
            .dependencies()
            .iter()
            .filter_map(|name| self.lookup(task, name))
            .collect()
    }

    fn visit<'a>(
        &'a self,
        task: &'a Task,
        option: &'a TaskOption,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        ordered: &mut Vec<&'a TaskOption>,
    ) -> ConfigResult<()> {
        let name = option.name.as_str();
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(name);
                return Err(ConfigError::CircularOption(cycle.join(" -> ")));
            }
            None => {}
        }

        marks.insert(name, Mark::Visiting);
        path.push(name);

        for dependency in self.dependencies(task, option) {
            self.visit(task, dependency, marks, path, ordered)?;
        }

        path.pop();
        marks.insert(name, Mark::Done);
        ordered.push(option);
        Ok(())
    }

    /// Resolve a task's arguments and option closure into `ctx.vars`
    pub fn resolve(&self, task: &Task, ctx: &mut Context) -> Result<()> {
        for arg in &task.args {
            let value = arg.evaluate(ctx)?;
            ctx.set_var(arg.name.clone(), value);
        }

        for option in self.find_all_options(task)? {
            let value = option.evaluate(ctx)?;
            tracing::debug!(task = %task.name, option = %option.name, value = %value, "resolved option");
            ctx.set_var(option.name.clone(), value);
        }

        Ok(())
    }

    /// Resolve and run a task by name
    pub fn invoke(&self, name: &str, ctx: &mut Context) -> Result<()> {
        let task = self.task(name)?;

        if ctx.is_task_in_stack(name) {
            return Err(ExecutionError::Recursion(name.to_string()).into());
        }

        self.resolve(task, ctx)?;

        ctx.push_task(name.to_string());
        let result = task.execute(self, ctx);
        ctx.pop_task();

        result
    }

    /// Invoke a task from inside another task's run step
    ///
    /// The subtask gets a fresh context. Values given on the command line for global
    /// options carry over; the step's own `options` are interpolated and passed on top.
    pub(crate) fn run_subtask(&self, subtask: &SubTask, ctx: &Context) -> Result<()> {
        let mut passed: HashMap<String, String> = self
            .options
            .iter()
            .filter_map(|opt| {
                ctx.passed
                    .get(&opt.name)
                    .map(|value| (opt.name.clone(), value.clone()))
            })
            .collect();

        for (name, value) in &subtask.options {
            passed.insert(name.clone(), interpolate(value, &ctx.vars));
        }

        let mut child = ctx.child(passed);
        self.invoke(&subtask.name, &mut child)
    }
}
