//! Verbosity-gated, coloured output

use colored::Colorize;
use std::fmt::Display;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Print nothing at all
    Silent = 0,
    /// Only command output and errors
    Quiet = 1,
    #[default]
    Normal = 2,
    Verbose = 3,
}

/// Prefix printed before each line of command output
const OUTPUT_PREFIX: &str = "=>";

/// Writes CLI output at the appropriate level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logger {
    pub verbosity: Verbosity,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Logger { verbosity }
    }

    /// A logger that prints nothing
    pub fn silent() -> Self {
        Logger::new(Verbosity::Silent)
    }

    /// Announce a command line before it runs
    pub fn print_command(&self, command: &str) {
        if self.verbosity < Verbosity::Normal {
            return;
        }
        eprintln!("{} {}", "$".blue().bold(), command.bold());
    }

    /// Forward one line of a running command's output
    pub fn print_command_output(&self, line: &str) {
        if self.verbosity <= Verbosity::Silent {
            return;
        }
        if self.verbosity >= Verbosity::Normal {
            println!("{} {}", OUTPUT_PREFIX.dimmed(), line);
        } else {
            println!("{}", line);
        }
    }

    pub fn print_task_start(&self, task_name: &str) {
        self.debug(format!("Running task: {}", task_name));
    }

    pub fn print_task_complete(&self, task_name: &str) {
        self.debug(format!("Task completed: {}", task_name));
    }

    pub fn debug(&self, message: impl Display) {
        if self.verbosity < Verbosity::Verbose {
            return;
        }
        eprintln!("{} {}", "Debug".cyan().bold(), message);
    }

    pub fn error(&self, message: impl Display) {
        if self.verbosity <= Verbosity::Silent {
            return;
        }
        eprintln!("{} {}", "Error".red().bold(), message);
    }
}
