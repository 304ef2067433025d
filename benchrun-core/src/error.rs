//! Pipeline Errors
//!
//! Everything that can end a run early. Failed commands keep their own exit
//! code, everything else exits with 1.

use crate::runner::CommandError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation database not produced at {}", .0.display())]
    MissingCompileDb(PathBuf),
}

impl PipelineError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit code the process should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Command(e) => e.exit_code(),
            _ => 1,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
