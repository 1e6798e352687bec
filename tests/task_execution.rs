//! Integration tests for task execution

mod common;

use brisk::error::{BriskError, ConfigError, ExecutionError, ResolveError};
use common::{context_in, read_output, registry};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_execute_simple_task() {
    let registry = registry(
        r#"
tasks:
  hello:
    run: echo "Hello, World!" > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("hello", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "Hello, World!");
}

#[test]
fn test_passed_value_beats_default() {
    let registry = registry(
        r#"
tasks:
  greet:
    options:
      name:
        default: World
    run: echo "Hello, ${name}!" > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry
        .invoke("greet", &mut context_in(&dir, &[("name", "Rust")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "Hello, Rust!");

    registry.invoke("greet", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "Hello, World!");
}

#[test]
fn test_conditional_default_follows_dependency() {
    let registry = registry(
        r#"
tasks:
  deploy:
    options:
      region:
        default:
          - when:
              equal: {cloud: gcp}
            value: europe-west1
          - when:
              - equal: {cloud: aws}
              - equal: {cloud: localstack}
            value: us-east-1
          - nowhere
      cloud:
        default: aws
    run: echo ${cloud}/${region} > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("deploy", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "aws/us-east-1");

    registry
        .invoke("deploy", &mut context_in(&dir, &[("cloud", "gcp")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "gcp/europe-west1");

    registry
        .invoke("deploy", &mut context_in(&dir, &[("cloud", "azure")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "azure/nowhere");
}

#[test]
fn test_command_default() {
    let registry = registry(
        r#"
tasks:
  version:
    options:
      rev:
        default:
          command: echo abc123
    run: echo "rev=${rev}" > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("version", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "rev=abc123");
}

#[test]
fn test_environment_value() {
    std::env::set_var("BRISK_IT_ENV_LEVEL", "from-env");
    let registry = registry(
        r#"
tasks:
  show:
    options:
      level:
        environment: BRISK_IT_ENV_LEVEL
        default: fallback
    run: echo ${level} > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("show", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "from-env");
}

#[test]
fn test_global_option_used_by_task() {
    let registry = registry(
        r#"
options:
  profile:
    default: dev
tasks:
  build:
    run: echo ${profile} > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("build", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "dev");
}

#[test]
fn test_required_option_missing() {
    let registry = registry(
        r#"
tasks:
  release:
    options:
      version:
        required: true
    run: echo ${version}
"#,
    );
    let dir = TempDir::new().unwrap();

    let result = registry.invoke("release", &mut context_in(&dir, &[]));
    assert!(matches!(
        result,
        Err(BriskError::Resolve(ResolveError::Required { option })) if option == "version"
    ));
}

#[test]
fn test_execute_task_with_failing_command() {
    let registry = registry(
        r#"
tasks:
  fail:
    run:
      - "false"
      - touch never.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    let result = registry.invoke("fail", &mut context_in(&dir, &[]));
    assert!(matches!(
        result,
        Err(BriskError::Execution(ExecutionError::CommandFailed { .. }))
    ));
    assert!(!dir.path().join("never.txt").exists());
}

#[test]
fn test_finally_runs_even_on_failure() {
    let registry = registry(
        r#"
tasks:
  fail_with_finally:
    run: "false"
    finally:
      - echo "Finally block" > finally_ran.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    let result = registry.invoke("fail_with_finally", &mut context_in(&dir, &[]));

    // Task should fail, but finally block should have run
    assert!(result.is_err());
    assert!(dir.path().join("finally_ran.txt").exists());
}

#[test]
fn test_run_error_takes_precedence_over_finally() {
    let registry = registry(
        r#"
tasks:
  t:
    run: exit 3
    finally: exit 5
"#,
    );
    let dir = TempDir::new().unwrap();

    match registry.invoke("t", &mut context_in(&dir, &[])) {
        Err(BriskError::Execution(ExecutionError::CommandFailed { status, .. })) => {
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected command failure, got {:?}", other),
    }
}

#[test]
fn test_execute_task_with_conditional() {
    let registry = registry(
        r#"
tasks:
  conditional:
    options:
      env:
        default: dev
      verbose:
        type: bool
    run:
      - when:
          equal: {env: prod}
        command: echo production >> out.txt
      - when: verbose
        command: echo verbose >> out.txt
      - echo always >> out.txt
"#,
    );

    let dir = TempDir::new().unwrap();
    registry
        .invoke("conditional", &mut context_in(&dir, &[("env", "prod")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "production\nalways");

    let dir = TempDir::new().unwrap();
    registry
        .invoke("conditional", &mut context_in(&dir, &[("verbose", "true")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "verbose\nalways");
}

#[test]
fn test_execute_task_with_set_environment() {
    let registry = registry(
        r#"
tasks:
  set_env:
    options:
      value:
        default: test_value
    run:
      - set-environment:
          BRISK_IT_SET_VAR: "${value}"
      - command: echo "$BRISK_IT_SET_VAR" > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("set_env", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "test_value");
    assert_eq!(std::env::var("BRISK_IT_SET_VAR").unwrap(), "test_value");
}

#[test]
fn test_subtask_with_options() {
    let registry = registry(
        r#"
tasks:
  outer:
    options:
      who:
        default: team
    run:
      - task:
          name: inner
          options:
            greeting: "hi ${who}"
      - echo done >> out.txt
  inner:
    private: true
    options:
      greeting:
        default: hello
    run: echo ${greeting} >> out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry.invoke("outer", &mut context_in(&dir, &[])).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "hi team\ndone");
}

#[test]
fn test_subtask_inherits_passed_globals() {
    let registry = registry(
        r#"
options:
  mode:
    default: debug
tasks:
  outer:
    run:
      - echo outer-${mode} >> out.txt
      - task: inner
  inner:
    run: echo inner-${mode} >> out.txt
"#,
    );
    let dir = TempDir::new().unwrap();

    registry
        .invoke("outer", &mut context_in(&dir, &[("mode", "release")]))
        .unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "outer-release\ninner-release");
}

#[test]
fn test_command_dir_and_print() {
    let registry = registry(
        r#"
tasks:
  nested:
    options:
      sub:
        default: subdir
    run:
      command:
        exec: pwd > here.txt
        print: recording location
        dir: ${sub}
"#,
    );
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("subdir")).unwrap();

    registry.invoke("nested", &mut context_in(&dir, &[])).unwrap();
    let here = fs::read_to_string(dir.path().join("subdir").join("here.txt")).unwrap();
    assert!(here.trim_end().ends_with("subdir"));
}

#[test]
fn test_interpreter_from_config() {
    let registry = registry(
        r#"
interpreter: [bash, -c]
tasks:
  arrays:
    run: arr=(a b c); echo ${arr[1]} > out.txt
"#,
    );
    let dir = TempDir::new().unwrap();
    let mut ctx = context_in(&dir, &[]).with_interpreter(registry.interpreter.clone().unwrap());

    registry.invoke("arrays", &mut ctx).unwrap();
    assert_eq!(read_output(&dir, "out.txt"), "b");
}

#[test]
fn test_unknown_task() {
    let registry = registry("tasks: {}");
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        registry.invoke("nope", &mut context_in(&dir, &[])),
        Err(BriskError::Config(ConfigError::TaskNotFound(_)))
    ));
}

#[test]
fn test_task_stack_prevents_recursion() {
    let registry = registry(
        r#"
tasks:
  recursive:
    run: echo "This task"
"#,
    );
    let dir = TempDir::new().unwrap();
    let mut ctx = context_in(&dir, &[]);

    // Simulate the task already being in the stack
    ctx.push_task("recursive".to_string());

    assert!(matches!(
        registry.invoke("recursive", &mut ctx),
        Err(BriskError::Execution(ExecutionError::Recursion(_)))
    ));
}
