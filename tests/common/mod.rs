//! Common test utilities
#![allow(dead_code)]

use brisk::config::parse_config;
use brisk::runner::{Context, TaskRegistry};
use brisk::ui::Logger;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory with a brisk.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("brisk.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Create a test config in a subdirectory
pub fn create_test_config_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("brisk.yml");
    let sub_dir = temp_dir.path().join("subdir");

    fs::write(&config_path, content).unwrap();
    fs::create_dir(&sub_dir).unwrap();

    (temp_dir, config_path, sub_dir)
}

/// Parse a config and build its registry
pub fn registry(yaml: &str) -> TaskRegistry {
    TaskRegistry::from_config(parse_config(yaml).unwrap()).unwrap()
}

/// A silent context running in `dir` with the given passed values
pub fn context_in(dir: &TempDir, passed: &[(&str, &str)]) -> Context {
    let passed: HashMap<String, String> = passed
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Context::new()
        .with_working_dir(dir.path().to_path_buf())
        .with_passed(passed)
        .with_logger(Logger::silent())
}

/// Read a file written by a task, without its trailing newline
pub fn read_output(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name))
        .unwrap()
        .trim_end()
        .to_string()
}
