//! Main CLI application

use crate::cli::flag::{copy_flags, flag_app, passed_values};
use crate::config::{find_config_file, load_env_files, parse_config_file, Config};
use crate::error::{BriskError, ConfigError};
use crate::runner::{Context, TaskRegistry};
use crate::ui::{Logger, Verbosity};
use anyhow::Context as _;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name used for the CLI when the config does not set one
const DEFAULT_NAME: &str = "brisk";

/// Path used for env-file lookup when no config file exists
const CONFIG_PLACEHOLDER: &str = "brisk.yml";

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Tasks and options from the config
    registry: TaskRegistry,
    /// Directory commands run in
    working_dir: PathBuf,
}

impl App {
    /// Create an app from a loaded configuration
    ///
    /// `config_path` is used to find env files and the working directory; it need not
    /// exist when no config file was found.
    pub fn from_config(config: Config, config_path: &Path) -> Result<Self, BriskError> {
        let loaded = load_env_files(&config, config_path)?;
        tracing::debug!(count = loaded.len(), "loaded env files");

        let registry = TaskRegistry::from_config(config)?;
        let command = copy_flags(new_app(&registry), &flag_app(&registry)?);

        let working_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(App {
            command,
            registry,
            working_dir,
        })
    }

    /// The full command tree, including synthesized flags
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Run the application with command line arguments
    pub fn run(mut self, args: Vec<String>) -> anyhow::Result<()> {
        let matches = match self.command.clone().try_get_matches_from(args) {
            Ok(matches) => matches,
            // --help and --version
            Err(e) if !e.use_stderr() => {
                e.print()?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(shell) = matches.get_one::<Shell>("completion") {
            let name = self.command.get_name().to_string();
            clap_complete::generate(*shell, &mut self.command, name, &mut io::stdout());
            return Ok(());
        }

        let verbosity = get_verbosity(&matches);

        // Check if a task was specified
        let Some((task_name, task_matches)) = matches.subcommand() else {
            self.command.print_help()?;
            println!();
            return Ok(());
        };

        let task = self.registry.task(task_name)?;
        let closure = self.registry.find_all_options(task)?;
        let passed = passed_values(task_matches, task, &closure);

        let mut ctx = Context::new()
            .with_working_dir(self.working_dir.clone())
            .with_passed(passed)
            .with_logger(Logger::new(verbosity));

        if let Some(interpreter) = &self.registry.interpreter {
            ctx = ctx.with_interpreter(interpreter.clone());
        }

        self.registry
            .invoke(task_name, &mut ctx)
            .with_context(|| format!("task `{}` failed", task_name))
    }
}

/// Build the clap command: global flags, then one subcommand per task with its args
///
/// Option flags are added afterwards with [`copy_flags`].
pub fn new_app(registry: &TaskRegistry) -> Command {
    let mut cmd = Command::new(
        registry
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
    )
    .version(crate::VERSION)
    .about(
        registry
            .usage
            .clone()
            .unwrap_or_else(|| "A YAML-configured task runner".to_string()),
    )
    .arg(
        Arg::new("file")
            .short('f')
            .long("file")
            .value_name("FILE")
            .help("Set file to use as the config file")
            .global(true),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Only print command output and errors")
            .action(ArgAction::SetTrue)
            .global(true),
    )
    .arg(
        Arg::new("silent")
            .short('s')
            .long("silent")
            .help("Print no output")
            .action(ArgAction::SetTrue)
            .global(true),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Print verbose output")
            .action(ArgAction::SetTrue)
            .global(true),
    )
    .arg(
        Arg::new("completion")
            .long("completion")
            .value_name("SHELL")
            .help("Print a shell completion script")
            .value_parser(clap::value_parser!(Shell)),
    );

    for task in registry.tasks.values() {
        let mut task_cmd = Command::new(task.name.clone())
            .about(task.usage.clone().unwrap_or_default())
            .hide(task.private);

        if let Some(desc) = &task.description {
            task_cmd = task_cmd.long_about(desc.clone());
        }

        for arg in &task.args {
            let mut arg_def = Arg::new(arg.name.clone())
                .value_name(arg.name.to_uppercase())
                .help(arg.usage.clone().unwrap_or_default())
                .required(arg.required);

            if !arg.values_allowed.is_empty() {
                arg_def = arg_def.value_parser(clap::builder::PossibleValuesParser::new(
                    arg.values_allowed.clone(),
                ));
            }

            task_cmd = task_cmd.arg(arg_def);
        }

        cmd = cmd.subcommand(task_cmd);
    }

    cmd
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown unless `--verbose`
/// was passed.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("brisk=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brisk=warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .try_init();
}

/// Run the CLI application
pub fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    init_tracing(has_verbose_flag(&args));

    let (config, config_path) = match extract_file_arg(&args) {
        Some(path) => {
            let config = parse_config_file(&path)
                .with_context(|| format!("could not load {}", path.display()))?;
            (config, path)
        }
        None => match find_config_file() {
            Ok(path) => {
                let config = parse_config_file(&path)
                    .with_context(|| format!("could not load {}", path.display()))?;
                (config, path)
            }
            // Without a config file there are no tasks, but help and completion work
            Err(ConfigError::NotFound(searched)) => {
                tracing::debug!("no config file found (searched: {})", searched);
                (Config::default(), PathBuf::from(CONFIG_PLACEHOLDER))
            }
            Err(e) => return Err(e.into()),
        },
    };

    App::from_config(config, &config_path)?.run(args)
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for (i, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--file=") {
            return Some(PathBuf::from(path));
        }
        if (arg == "--file" || arg == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}

/// Short global switches that may be clustered with `-v`
const GLOBAL_SWITCHES: &[char] = &['q', 's', 'v'];

/// Whether --verbose was passed, checked before clap parsing
///
/// Only `--verbose`, `-v` and clusters of global switches such as `-qv` count.
/// Scanning stops at `--`.
fn has_verbose_flag(args: &[String]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| arg.as_str() != "--")
        .any(|arg| {
            if arg == "--verbose" {
                return true;
            }
            match arg.strip_prefix('-') {
                Some(cluster) if !cluster.starts_with('-') => {
                    cluster.contains('v') && cluster.chars().all(|c| GLOBAL_SWITCHES.contains(&c))
                }
                _ => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn app(yaml: &str) -> App {
        let config = parse_config(yaml).unwrap();
        App::from_config(config, Path::new("brisk.yml")).unwrap()
    }

    #[test]
    fn test_get_verbosity_normal() {
        let cmd = Command::new("test")
            .arg(Arg::new("quiet").long("quiet").action(ArgAction::SetTrue))
            .arg(Arg::new("silent").long("silent").action(ArgAction::SetTrue))
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue));
        let matches = cmd.get_matches_from(vec!["test"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_get_verbosity_silent_wins() {
        let registry = TaskRegistry::from_config(Config::default()).unwrap();
        let matches = new_app(&registry).get_matches_from(vec!["brisk", "-q", "-s"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Silent);
    }

    #[test]
    fn test_extract_file_arg() {
        let args = vec![
            "brisk".to_string(),
            "--file".to_string(),
            "test.yml".to_string(),
        ];
        let path = extract_file_arg(&args);
        assert_eq!(path, Some(PathBuf::from("test.yml")));
    }

    #[test]
    fn test_extract_file_arg_short() {
        let args = vec!["brisk".to_string(), "-f".to_string(), "test.yml".to_string()];
        let path = extract_file_arg(&args);
        assert_eq!(path, Some(PathBuf::from("test.yml")));
    }

    #[test]
    fn test_extract_file_arg_equals() {
        let args = vec!["brisk".to_string(), "--file=other.yml".to_string()];
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("other.yml")));
    }

    #[test]
    fn test_has_verbose_flag() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(has_verbose_flag(&args(&["brisk", "--verbose", "build"])));
        assert!(has_verbose_flag(&args(&["brisk", "-qv", "build"])));
        assert!(!has_verbose_flag(&args(&["brisk", "build", "--version-tag", "x"])));
        assert!(!has_verbose_flag(&args(&["brisk", "build", "--env", "-dev"])));
        assert!(!has_verbose_flag(&args(&["brisk", "build", "--", "-v"])));
        assert!(has_verbose_flag(&args(&["brisk", "-sv", "build"])));
    }

    #[test]
    fn test_app_has_task_flags_and_args() {
        let app = app(
            r#"
tasks:
  deploy:
    usage: Ship it
    args:
      target: {values: [dev, prod]}
    options:
      tag:
        short: t
      secret:
        private: true
        default: x
    run: echo ${target} ${tag}
  helper:
    private: true
    run: echo
"#,
        );

        let deploy = app.command().find_subcommand("deploy").unwrap();
        let ids: Vec<String> = deploy
            .get_arguments()
            .map(|arg| arg.get_id().to_string())
            .collect();
        assert_eq!(ids, vec!["target", "tag"]);
        assert_eq!(deploy.get_about().map(|a| a.to_string()), Some("Ship it".to_string()));

        let helper = app.command().find_subcommand("helper").unwrap();
        assert!(helper.is_hide_set());
    }

    #[test]
    fn test_app_rejects_out_of_range_value() {
        let app = app(
            r#"
tasks:
  t:
    options:
      color: {values: [red, green]}
    run: echo ${color}
"#,
        );

        let result = app.run(vec![
            "brisk".to_string(),
            "t".to_string(),
            "--color".to_string(),
            "blue".to_string(),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_app_runs_task() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = parse_config(
            r#"
tasks:
  touch:
    options:
      name:
        default: made
    run: touch ${name}
"#,
        )
        .unwrap();
        let app = App::from_config(config, &temp_dir.path().join("brisk.yml")).unwrap();

        app.run(vec!["brisk".to_string(), "-s".to_string(), "touch".to_string()])
            .unwrap();
        assert!(temp_dir.path().join("made").is_file());
    }
}
