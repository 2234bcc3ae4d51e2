use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::error::{FrameError, Result};
use crate::fec::{ParityEncoder, CHECKED_BLOCK_SIZE, PARITY_SIZE};

/// Fixed payload length carried by every frame.
pub const PAYLOAD_SIZE: usize = 256;

/// Filler byte used to pad short payloads.
pub const PAD_BYTE: u8 = 0x55;

/// Preamble: 16 repeats of 0x55, for demodulator timing recovery.
pub const PREAMBLE: [u8; 16] = [PAD_BYTE; 16];

/// Unique word marking the start of a packet.
pub const SYNC_WORD: [u8; 4] = [0xAB, 0xCD, 0xEF, 0x01];

/// Checksum length on the wire.
pub const CHECKSUM_SIZE: usize = 2;

/// Preamble + sync word.
pub const HEADER_SIZE: usize = PREAMBLE.len() + SYNC_WORD.len();

/// Wire size of a frame without parity.
pub const FRAME_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE + CHECKSUM_SIZE;

/// Wire size of a frame carrying parity.
pub const FEC_FRAME_SIZE: usize = FRAME_SIZE + PARITY_SIZE;

/// Pad (0x55) or truncate a payload to exactly [`PAYLOAD_SIZE`] bytes.
pub fn normalize_payload(payload: &[u8]) -> [u8; PAYLOAD_SIZE] {
    let mut packet = [PAD_BYTE; PAYLOAD_SIZE];
    let len = payload.len().min(PAYLOAD_SIZE);
    packet[..len].copy_from_slice(&payload[..len]);
    packet
}

/// Encode a payload into a transmit frame.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────┬────────────────┬──────────────┬─────────────────┐
/// │ Preamble     │ Sync word   │ Payload        │ Checksum     │ Parity          │
/// │ 0x55 x16     │ AB CD EF 01 │ (256B, padded) │ (2B LE)      │ (65B, FEC only) │
/// └──────────────┴─────────────┴────────────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], parity: Option<&dyn ParityEncoder>, dst: &mut BytesMut) {
    let packet = normalize_payload(payload);
    let crc = checksum::checksum(&packet).to_le_bytes();

    let total = if parity.is_some() {
        FEC_FRAME_SIZE
    } else {
        FRAME_SIZE
    };
    dst.reserve(total);
    dst.put_slice(&PREAMBLE);
    dst.put_slice(&SYNC_WORD);
    dst.put_slice(&packet);
    dst.put_slice(&crc);

    if let Some(encoder) = parity {
        let mut block = [0u8; CHECKED_BLOCK_SIZE];
        block[..PAYLOAD_SIZE].copy_from_slice(&packet);
        block[PAYLOAD_SIZE..].copy_from_slice(&crc);
        dst.put_slice(&encoder.encode_parity(&block));
    }
}

/// Frame a payload into a standalone buffer.
pub fn frame_packet(payload: &[u8], parity: Option<&dyn ParityEncoder>) -> Bytes {
    let mut buf = BytesMut::new();
    encode_frame(payload, parity, &mut buf);
    buf.freeze()
}

/// A frame split back into its fields.
#[derive(Debug, Clone)]
pub struct Deframed {
    /// The 256-byte payload.
    pub payload: Bytes,
    /// The checksum carried on the wire.
    pub checksum: u16,
    /// Parity bytes, if the frame carried them.
    pub parity: Option<Bytes>,
}

/// Locate the sync word in `src` and verify the packet that follows it.
///
/// Parity is returned untouched: correcting errors is the job of the
/// external FEC decoder, not this crate.
pub fn decode_frame(src: &[u8]) -> Result<Deframed> {
    let start = src
        .windows(SYNC_WORD.len())
        .position(|window| window == SYNC_WORD)
        .ok_or(FrameError::MissingSyncWord)?
        + SYNC_WORD.len();

    let body = &src[start..];
    let needed = PAYLOAD_SIZE + CHECKSUM_SIZE;
    if body.len() < needed {
        return Err(FrameError::Truncated {
            actual: body.len(),
            needed,
        });
    }

    let payload = &body[..PAYLOAD_SIZE];
    let received = u16::from_le_bytes([body[PAYLOAD_SIZE], body[PAYLOAD_SIZE + 1]]);
    let expected = checksum::checksum(payload);
    if expected != received {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: received,
        });
    }

    let rest = &body[needed..];
    let parity = (rest.len() >= PARITY_SIZE).then(|| Bytes::copy_from_slice(&rest[..PARITY_SIZE]));

    Ok(Deframed {
        payload: Bytes::copy_from_slice(payload),
        checksum: received,
        parity,
    })
}

/// Frames payloads with a fixed FEC setting.
#[derive(Clone, Default)]
pub struct Framer {
    parity: Option<std::sync::Arc<dyn ParityEncoder>>,
}

impl Framer {
    /// Framer without parity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Framer appending parity from `encoder`.
    pub fn with_parity(encoder: std::sync::Arc<dyn ParityEncoder>) -> Self {
        Self {
            parity: Some(encoder),
        }
    }

    /// Whether frames carry parity.
    pub fn fec_enabled(&self) -> bool {
        self.parity.is_some()
    }

    /// Frame a payload.
    pub fn frame(&self, payload: &[u8]) -> Bytes {
        frame_packet(payload, self.parity.as_deref())
    }

    /// Wire size of every frame this framer produces.
    pub fn frame_size(&self) -> usize {
        if self.fec_enabled() {
            FEC_FRAME_SIZE
        } else {
            FRAME_SIZE
        }
    }
}

impl std::fmt::Debug for Framer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framer")
            .field("fec", &self.fec_enabled())
            .finish()
    }
}

/// Configuration for packet I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameConfig {
    /// Input packets are hex-encoded lines rather than raw 256-byte blocks.
    pub hex_input: bool,
}
