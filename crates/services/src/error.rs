//! Shared error types for the services crate.
//!
//! Registry operations never fail: an unknown session or a rejected
//! transition comes back as `None`/`false`. Errors here cover loading a
//! question bank, reading configuration and exporting results.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId};

/// Errors emitted while building a `QuestionBank`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid question bank file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors emitted while loading `QuizConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Errors emitted when exporting a score report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
