use std::io::{BufRead, BufReader, ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{FrameConfig, PAYLOAD_SIZE};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads demodulated, FEC-decoded packets from any `Read` stream.
///
/// The upstream decoder emits packets either as raw 256-byte blocks or as
/// one hex string per line. Partial reads are handled internally; callers
/// always get whole packets.
pub struct PacketReader<T> {
    inner: BufReader<T>,
    buf: BytesMut,
    config: FrameConfig,
    line: usize,
}

impl<T: Read> PacketReader<T> {
    /// Create a reader for raw binary packets.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: BytesMut::with_capacity(PAYLOAD_SIZE),
            config,
            line: 0,
        }
    }

    /// Read the next packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at end of stream, including
    /// a stream that ends part-way through a packet.
    pub fn read_packet(&mut self) -> Result<Bytes> {
        if self.config.hex_input {
            self.read_hex_packet()
        } else {
            self.read_raw_packet()
        }
    }

    fn read_raw_packet(&mut self) -> Result<Bytes> {
        loop {
            if self.buf.len() >= PAYLOAD_SIZE {
                return Ok(self.buf.split_to(PAYLOAD_SIZE).freeze());
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let want = (PAYLOAD_SIZE - self.buf.len()).min(READ_CHUNK_SIZE);
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::debug!(
                        pending = self.buf.len(),
                        "discarding partial packet at end of stream"
                    );
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn read_hex_packet(&mut self) -> Result<Bytes> {
        let mut text = String::new();
        loop {
            text.clear();
            let read = match self.inner.read_line(&mut text) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };
            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }
            self.line += 1;

            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            return hex::decode(trimmed)
                .map(Bytes::from)
                .map_err(|source| FrameError::InvalidHex {
                    line: self.line,
                    source,
                });
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Bytes>;

    /// Yields packets until the stream closes. Other errors are yielded and
    /// iteration continues.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_packet() {
            Err(FrameError::ConnectionClosed) => None,
            other => Some(other),
        }
    }
}
