//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file does not exist.
    #[error("config not found at {path}. Create it or pass --config")]
    ConfigNotFound { path: PathBuf },

    /// No route with this name is configured.
    #[error("no route named '{name}'. Known routes: {known:?}")]
    UnknownRoute { name: String, known: Vec<String> },

    /// The request was rejected by the route's rules.
    #[error("{0}")]
    Rejected(guard::Rejection),

    /// An error occurred in the guard layer.
    #[error(transparent)]
    Guard(#[from] guard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
