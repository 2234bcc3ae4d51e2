use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that can occur on the receive side.
#[derive(Debug, thiserror::Error)]
pub enum RxError {
    /// I/O error (output directory, log files, UDP sockets).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading the packet stream.
    #[error("frame error: {0}")]
    Frame(#[from] wenet_frame::FrameError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RxError>;

/// Failure of the external image decoder.
#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    /// The decoder program could not be started.
    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoder ran and reported failure.
    #[error("{} exited with {status}", program.display())]
    Failed { program: PathBuf, status: ExitStatus },

    /// The input could not be staged for decoding.
    #[error("could not write {}: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
