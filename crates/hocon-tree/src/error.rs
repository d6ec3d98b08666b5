//! The error type shared by parsing, resolution and lookup.

use std::fmt;

use hocon_tokenizer::Span;
use thiserror::Error;

use crate::Origin;

/// Result type used throughout the HOCON crates.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Everything that can go wrong loading or reading a configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Malformed document text.
    #[error("{origin}: {message}")]
    Parse {
        origin: Origin,
        message: String,
        /// Byte range of the offending token, when known.
        span: Option<Span>,
    },

    /// A malformed path expression.
    #[error("{}Invalid path '{}': {}", origin_prefix(.origin.as_ref()), .path, .message)]
    BadPath {
        origin: Option<Origin>,
        path: String,
        message: String,
    },

    /// A substitution with no value to refer to, or caught in a cycle.
    #[error("{origin}: Could not resolve substitution to a value: {detail}")]
    UnresolvedSubstitution { origin: Origin, detail: String },

    /// A value was read before its tree had been resolved.
    #[error("{message}")]
    NotResolved { message: String },

    /// No value at the requested path.
    #[error("{}No configuration setting found for key '{}'", origin_prefix(.origin.as_ref()), .path)]
    Missing { origin: Option<Origin>, path: String },

    /// The requested path holds null.
    #[error("{origin}: Configuration key '{path}' is set to null but expected {expected}")]
    Null {
        origin: Origin,
        path: String,
        expected: String,
    },

    /// A value of one type where another was needed.
    #[error("{origin}: {message}")]
    WrongType { origin: Origin, message: String },

    /// A value of the right type with unusable content.
    #[error("{origin}: Invalid value at '{path}': {message}")]
    BadValue {
        origin: Origin,
        path: String,
        message: String,
    },

    /// One or more problems found when checking against a reference tree.
    #[error("{}", render_problems(.problems))]
    Validation { problems: Vec<ValidationProblem> },

    /// Reading a file failed.
    #[error("{origin}: {message}")]
    Io { origin: Origin, message: String },

    /// An included document could not be loaded.
    #[error("{origin}: {message}")]
    Include { origin: Origin, message: String },

    /// An internal invariant did not hold.
    #[error("bug or broken: {0}")]
    BugOrBroken(String),
}

impl ConfigError {
    pub fn parse(origin: Origin, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            origin,
            message: message.into(),
            span: None,
        }
    }

    pub fn wrong_type(origin: Origin, message: impl Into<String>) -> Self {
        ConfigError::WrongType {
            origin,
            message: message.into(),
        }
    }

    pub fn bug(message: impl Into<String>) -> Self {
        ConfigError::BugOrBroken(message.into())
    }

    /// True for [`ConfigError::Missing`] and its refinement [`ConfigError::Null`].
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::Missing { .. } | ConfigError::Null { .. })
    }

    /// The origin the error points at, if it has one.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            ConfigError::Parse { origin, .. }
            | ConfigError::UnresolvedSubstitution { origin, .. }
            | ConfigError::Null { origin, .. }
            | ConfigError::WrongType { origin, .. }
            | ConfigError::BadValue { origin, .. }
            | ConfigError::Io { origin, .. }
            | ConfigError::Include { origin, .. } => Some(origin),
            ConfigError::BadPath { origin, .. } | ConfigError::Missing { origin, .. } => {
                origin.as_ref()
            }
            ConfigError::NotResolved { .. }
            | ConfigError::Validation { .. }
            | ConfigError::BugOrBroken(_) => None,
        }
    }
}

fn origin_prefix(origin: Option<&Origin>) -> String {
    match origin {
        Some(origin) => format!("{}: ", origin),
        None => String::new(),
    }
}

fn render_problems(problems: &[ValidationProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single finding from validating a tree against a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationProblem {
    pub path: String,
    pub origin: Origin,
    pub problem: String,
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.origin, self.path, self.problem)
    }
}
