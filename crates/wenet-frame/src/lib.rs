//! Fixed-length radio framing for the Wenet downlink.
//!
//! Every packet on the air is framed with:
//! - a 16-byte 0x55 preamble for demodulator timing recovery
//! - the 4-byte unique word `AB CD EF 01`
//! - exactly 256 payload bytes (padded with 0x55 or truncated)
//! - a little-endian CRC-16/CCITT-FALSE of the payload
//! - optionally, 65 bytes of repeat-accumulate parity over payload + checksum
//!
//! The receive side never sees these frames: the external modem and FEC
//! decoder hand back bare 256-byte packets, read here by [`PacketReader`].

pub mod checksum;
pub mod codec;
pub mod error;
pub mod fec;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use checksum::checksum;
pub use codec::{
    decode_frame, encode_frame, frame_packet, normalize_payload, Deframed, FrameConfig, Framer,
    FEC_FRAME_SIZE, FRAME_SIZE, PAD_BYTE, PAYLOAD_SIZE, PREAMBLE, SYNC_WORD,
};
pub use error::{FrameError, Result};
pub use fec::{ParityEncoder, RepeatAccumulateEncoder, CHECKED_BLOCK_SIZE, PARITY_SIZE};
pub use reader::PacketReader;
pub use writer::{BitDumpWriter, FrameWriter};

#[cfg(feature = "async")]
pub use async_codec::PacketCodec;
