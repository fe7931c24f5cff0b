//! Guard error types.
//!
//! These are faults of the enforcement machinery itself. Request failures
//! (missing fields, unrelated callers, unknown resources) are never errors:
//! they travel as [`Outcome::Fail`](crate::Outcome::Fail).

use thiserror::Error;

/// Guard errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A rule or route was registered with an unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to parse a route configuration file.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The resource accessor failed for a reason other than "not found".
    #[error("resource accessor failed in rule '{rule}': {source}")]
    Accessor {
        rule: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The route declares a resource parameter but the request did not carry it.
    #[error("request is missing resource parameter '{param}'")]
    MissingResourceParam { param: String },

    /// A rule that addresses a resource was evaluated against a context
    /// without a resource key.
    #[error("rule '{rule}' evaluated without a resource key")]
    NoResourceKey { rule: &'static str },

    /// An I/O error occurred while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
