//! CLI error handling.

use thiserror::Error;

use crate::Exit;

/// CLI error type, mapped onto process exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] reqflow_core::ParseReport),

    #[error("{0}")]
    Corpus(#[from] reqflow_corpus::CorpusError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The inputs were readable but did not pass their checks.
    #[error("{0}")]
    Validation(String),
}

impl CliError {
    /// The exit code this error maps to.
    pub fn exit_code(&self) -> Exit {
        match self {
            CliError::Io(_) => Exit::IoError,
            CliError::Parse(_) | CliError::Validation(_) => Exit::ValidationError,
            CliError::Corpus(reqflow_corpus::CorpusError::Io(_)) => Exit::IoError,
            CliError::Corpus(_) => Exit::ValidationError,
            CliError::Json(_) => Exit::GeneralError,
        }
    }
}
