//! Variable interpolation for strings
//!
//! Replaces `${name}` with the resolved value of `name`. Names with no resolved value
//! are left untouched so the shell can still expand its own `${VAR}` references.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"));

/// Interpolate variables in a string
///
/// Substitution is a single pass: values are inserted verbatim and never
/// re-interpolated.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(s, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names referenced with `${name}` in a string, in order of first appearance
pub fn referenced_variables(s: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in VARIABLE.captures_iter(s) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
