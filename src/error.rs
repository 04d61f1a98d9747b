use std::path::PathBuf;

use thiserror::Error;

use stepvm_core::{AstError, CompilationError, RuntimeError};

pub type Result<T> = std::result::Result<T, SessionError>;

/// Any failure surfaced by a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Ast(#[from] AstError),

    #[error(transparent)]
    Compile(#[from] CompilationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// `step` or `reset` before a successful compile.
    #[error("no program has been compiled")]
    NoProgram,

    /// `run` completed `steps` statements without reaching the end.
    #[error("program still running after {steps} statements")]
    RunLimitExceeded { steps: usize },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl SessionError {
    pub fn is_runtime(&self) -> bool {
        matches!(self, SessionError::Runtime(_))
    }

    /// Get the underlying runtime fault, if this is one.
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            SessionError::Runtime(err) => Some(err),
            _ => None,
        }
    }
}
