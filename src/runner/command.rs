//! Command execution
//!
//! Command lines are handed to the interpreter as a single argument, so shell syntax
//! works as written. Standard output and standard error share one pipe, which a
//! reader thread drains line by line while the child runs.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{interpolate, Command, Context};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::thread;

/// Build a process that runs `command_line` through the interpreter
fn shell_command(command_line: &str, interpreter: &[String]) -> ExecutionResult<StdCommand> {
    let Some((program, args)) = interpreter.split_first() else {
        return Err(ExecutionError::Launch {
            command: command_line.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no interpreter configured"),
        });
    };

    let mut command = StdCommand::new(program);
    command.args(args).arg(command_line);
    Ok(command)
}

/// Run a command line, forwarding its combined output to `sink` as it arrives
///
/// Returns once the child has exited and every line it wrote has been forwarded.
/// There is no timeout: the command runs to completion. A background process started
/// by the command keeps the pipe open, so this also waits for it to exit.
pub fn run_streaming<F>(
    command_line: &str,
    interpreter: &[String],
    dir: &Path,
    sink: F,
) -> ExecutionResult<()>
where
    F: FnMut(&str) + Send,
{
    let (reader, writer) = io::pipe().map_err(ExecutionError::Pipe)?;

    let spawned = {
        let mut command = shell_command(command_line, interpreter)?;
        let error_writer = writer.try_clone().map_err(ExecutionError::Pipe)?;
        command
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(writer)
            .stderr(error_writer);
        command.spawn()
        // `command` drops here and closes our copies of the write end, so the reader
        // sees end-of-input as soon as the child exits.
    };

    let mut child = spawned.map_err(|source| ExecutionError::Launch {
        command: command_line.to_string(),
        source,
    })?;

    let status = thread::scope(|scope| {
        let pump = scope.spawn(move || forward_lines(reader, sink));
        let status = child.wait();
        if pump.join().is_err() {
            tracing::error!(command = %command_line, "output reader panicked");
        }
        status
    });

    let status = status.map_err(|source| ExecutionError::Launch {
        command: command_line.to_string(),
        source,
    })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed {
            command: command_line.to_string(),
            status,
        });
    }

    Ok(())
}

/// Drain `reader` until end-of-input, passing each line without its terminator
fn forward_lines<R: Read, F: FnMut(&str)>(reader: R, mut sink: F) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                sink(&String::from_utf8_lossy(&buf));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("failed to read command output: {}", e);
                break;
            }
        }
    }
}

/// Run a command line and return its standard output minus one trailing newline
///
/// Standard error is passed through to the terminal.
pub fn capture_output(command_line: &str, ctx: &Context) -> ExecutionResult<String> {
    let output = shell_command(command_line, &ctx.interpreter)?
        .current_dir(&ctx.working_dir)
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| ExecutionError::Launch {
            command: command_line.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ExecutionError::CommandFailed {
            command: command_line.to_string(),
            status: output.status,
        });
    }

    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if stdout.ends_with('\n') {
        stdout.pop();
        if stdout.ends_with('\r') {
            stdout.pop();
        }
    }
    Ok(stdout)
}

/// Execute a run-step command in the given context
pub fn execute_command(cmd: &Command, ctx: &Context, quiet: bool) -> ExecutionResult<()> {
    let exec_str = interpolate(cmd.exec(), &ctx.vars);

    // Print the command if not quiet
    if !quiet && !cmd.is_quiet() {
        ctx.logger.print_command(&interpolate(cmd.print(), &ctx.vars));
    }

    // Determine working directory
    let working_dir = match cmd.dir() {
        Some(dir) => ctx.working_dir.join(interpolate(dir, &ctx.vars)),
        None => ctx.working_dir.clone(),
    };

    let logger = ctx.logger;
    run_streaming(&exec_str, &ctx.interpreter, &working_dir, move |line| {
        logger.print_command_output(line)
    })
}
