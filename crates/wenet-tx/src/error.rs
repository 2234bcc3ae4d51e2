/// Errors that can occur on the transmit side.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// I/O error (image files, UDP socket, host stats).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame-level error from the radio sink.
    #[error("frame error: {0}")]
    Frame(#[from] wenet_frame::FrameError),

    /// The scheduler has gone away and its queues are closed.
    #[error("transmit queue closed")]
    QueueClosed,

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The scheduler thread panicked.
    #[error("scheduler thread panicked")]
    SchedulerPanicked,
}

pub type Result<T> = std::result::Result<T, TxError>;
