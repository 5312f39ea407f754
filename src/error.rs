//! Error types for the gesture crate
//!
//! Recognizers never fail: bad preconditions are ignored and broken invariants
//! panic. Only the ambient pieces (configuration files, raw property values,
//! event loop registration) report errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("failed to serialize TOML config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid side value {0} (expected 0-3)")]
    InvalidSide(u32),

    #[error("timer source registration failed: {0}")]
    TimerSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
