use crate::kind::PacketKind;

/// Errors produced when a packet does not match its declared layout.
///
/// These are values, not panics: callers log them and keep going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The packet had no bytes at all.
    #[error("empty packet")]
    Empty,

    /// The packet is shorter than its kind's layout requires.
    #[error("{kind} packet has invalid length ({actual} bytes, need {expected})")]
    InvalidLength {
        kind: PacketKind,
        expected: usize,
        actual: usize,
    },

    /// A kind-specific decoder was handed a packet with another tag.
    #[error("expected {expected} packet, got tag 0x{actual:02X}")]
    UnexpectedTag { expected: PacketKind, actual: u8 },

    /// A text field held non-ASCII bytes.
    #[error("{kind} packet contains non-ASCII text")]
    InvalidText { kind: PacketKind },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
