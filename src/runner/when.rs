//! When condition evaluation
//!
//! Conditions are plain data: each clause compares one named variable against a
//! literal. A [`When`] holds when all of its clauses hold; a [`WhenList`] holds when it
//! is empty or any of its whens holds.

use crate::config;
use crate::runner::Vars;

/// How a clause compares its variable with the literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Equal,
    NotEqual,
}

/// A single comparison against a named variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub kind: ClauseKind,
    pub variable: String,
    pub literal: String,
}

impl Clause {
    pub fn equal(variable: impl Into<String>, literal: impl Into<String>) -> Self {
        Clause {
            kind: ClauseKind::Equal,
            variable: variable.into(),
            literal: literal.into(),
        }
    }

    pub fn not_equal(variable: impl Into<String>, literal: impl Into<String>) -> Self {
        Clause {
            kind: ClauseKind::NotEqual,
            variable: variable.into(),
            literal: literal.into(),
        }
    }

    /// Missing variables compare as the empty string
    pub fn is_satisfied(&self, vars: &Vars) -> bool {
        let actual = vars.get(&self.variable).map(String::as_str).unwrap_or("");
        match self.kind {
            ClauseKind::Equal => actual == self.literal,
            ClauseKind::NotEqual => actual != self.literal,
        }
    }
}

/// A conjunction of clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct When {
    pub clauses: Vec<Clause>,
}

impl When {
    pub fn new(clauses: Vec<Clause>) -> Self {
        When { clauses }
    }

    pub fn from_config(config: config::WhenConfig) -> Self {
        match config {
            config::WhenConfig::Shorthand(name) => When::new(vec![Clause::equal(name, "true")]),
            config::WhenConfig::Clauses(clauses) => {
                let equal = clauses
                    .equal
                    .into_iter()
                    .map(|(var, lit)| Clause::equal(var, lit));
                let not_equal = clauses
                    .not_equal
                    .into_iter()
                    .map(|(var, lit)| Clause::not_equal(var, lit));
                When::new(equal.chain(not_equal).collect())
            }
        }
    }

    pub fn is_satisfied(&self, vars: &Vars) -> bool {
        self.clauses.iter().all(|clause| clause.is_satisfied(vars))
    }

    /// Names of the variables this when reads
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|clause| clause.variable.as_str())
    }
}

/// A disjunction of whens; empty means unconditionally true
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhenList(pub Vec<When>);

impl WhenList {
    pub fn from_config(config: Vec<config::WhenConfig>) -> Self {
        WhenList(config.into_iter().map(When::from_config).collect())
    }

    pub fn is_satisfied(&self, vars: &Vars) -> bool {
        self.0.is_empty() || self.0.iter().any(|when| when.is_satisfied(vars))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.0.iter().flat_map(When::variables)
    }
}
