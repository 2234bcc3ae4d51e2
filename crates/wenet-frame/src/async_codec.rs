//! `tokio_util::codec` adapter for packet streams.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{Framer, PAYLOAD_SIZE};
use crate::error::FrameError;

/// Decodes raw 256-byte packets and encodes payloads into transmit frames.
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    framer: Framer,
}

impl PacketCodec {
    /// Codec whose encoder frames with `framer`.
    pub fn new(framer: Framer) -> Self {
        Self { framer }
    }
}

impl Decoder for PacketCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < PAYLOAD_SIZE {
            src.reserve(PAYLOAD_SIZE - src.len());
            return Ok(None);
        }
        Ok(Some(src.split_to(PAYLOAD_SIZE).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(&self.framer.frame(&payload));
        Ok(())
    }
}
