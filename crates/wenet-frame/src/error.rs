/// Errors that can occur while framing, deframing or reading packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading packets or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The packet stream ended. Fatal for a receive session.
    #[error("packet stream closed")]
    ConnectionClosed,

    /// A hex-encoded input line could not be decoded.
    #[error("invalid hex packet on line {line}: {source}")]
    InvalidHex {
        line: usize,
        source: hex::FromHexError,
    },

    /// A parity generator table failed validation.
    #[error("invalid parity table: {0}")]
    InvalidParityTable(String),

    /// No sync word was found in a buffer handed to the deframer.
    #[error("sync word not found")]
    MissingSyncWord,

    /// The frame ended before the payload and checksum were complete.
    #[error("frame truncated ({actual} bytes after sync word, need {needed})")]
    Truncated { actual: usize, needed: usize },

    /// The received checksum does not match the payload.
    #[error("checksum mismatch (expected 0x{expected:04X}, got 0x{actual:04X})")]
    ChecksumMismatch { expected: u16, actual: u16 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
