//! Execution context for task running
//!
//! A context is created fresh for every task invocation and dropped when the task
//! finishes. Resolved values accumulate in `vars` as options are evaluated.

use crate::ui::Logger;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Resolved variable values, keyed by option or argument name
pub type Vars = HashMap<String, String>;

/// Default interpreter used to run command lines
pub const DEFAULT_INTERPRETER: &[&str] = &["sh", "-c"];

/// Execution context that tracks state during task execution
#[derive(Debug, Clone)]
pub struct Context {
    /// Current working directory
    pub working_dir: PathBuf,

    /// Values resolved so far for this invocation
    pub vars: Vars,

    /// Values supplied from outside (command-line flags, subtask options)
    pub passed: HashMap<String, String>,

    /// Interpreter argv prefix (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Stack of tasks being executed (for detecting recursion)
    pub task_stack: Vec<String>,

    /// Output sink for user-facing messages
    pub logger: Logger,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            vars: Vars::new(),
            passed: HashMap::new(),
            interpreter: DEFAULT_INTERPRETER.iter().map(|s| s.to_string()).collect(),
            task_stack: Vec::new(),
            logger: Logger::default(),
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: Vars) -> Self {
        self.vars = vars;
        self
    }

    /// Set externally supplied values
    pub fn with_passed(mut self, passed: HashMap<String, String>) -> Self {
        self.passed = passed;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the output logger
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Set a single variable
    pub fn set_var(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// A passed value counts as present only when non-empty
    pub fn passed_value(&self, name: &str) -> Option<&str> {
        self.passed
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Fresh context for invoking another task from this one
    ///
    /// Settings and the task stack carry over; resolved values do not.
    pub fn child(&self, passed: HashMap<String, String>) -> Self {
        Context {
            working_dir: self.working_dir.clone(),
            vars: Vars::new(),
            passed,
            interpreter: self.interpreter.clone(),
            task_stack: self.task_stack.clone(),
            logger: self.logger,
        }
    }

    /// Push a task onto the execution stack
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Pop a task from the execution stack
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Check if a task is in the execution stack (detect recursion)
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
