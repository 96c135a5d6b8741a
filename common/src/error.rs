use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure of a single pipeline step or install command.
///
/// Whether one of these aborts the run is decided by the step's
/// [`FailurePolicy`](crate::config::FailurePolicy), not by the variant.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("failed to execute {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} is not installed")]
    NotInstalled { tool: String },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
}

impl StepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

