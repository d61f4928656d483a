//! Error taxonomy shared by the controller, the engine adapter, and the
//! presentation layers.

use std::path::PathBuf;

use crate::registry::{JobId, JobState};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad caller input. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The engine could not resolve the URL (unreachable, unsupported or removed content).
    #[error("{0}")]
    Resolution(String),

    /// The engine failed while transferring or post-processing.
    #[error("{0}")]
    Transfer(String),

    /// Unknown job id, including ids evicted from the registry.
    #[error("download {0} not found")]
    NotFound(JobId),

    /// Artifact requested before the job reached `Completed`.
    #[error("download {id} is not ready ({state})")]
    NotReady { id: JobId, state: JobState },

    /// Job completed but its file is gone from disk.
    #[error("file not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Resolution(_) => "RESOLUTION_ERROR",
            Error::Transfer(_) => "TRANSFER_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::NotReady { .. } => "NOT_READY",
            Error::ArtifactMissing(_) => "ARTIFACT_MISSING",
            Error::Io(_) => "IO_ERROR",
        }
    }
}
