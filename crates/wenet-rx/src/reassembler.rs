//! Groups consecutive SSDV chunks into images.
//!
//! The link carries no explicit image boundaries. An image ends when a chunk
//! arrives with a different (callsign, image id), or when the session ends.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use wenet_packets::{ChunkHeader, ImageChunk, ImageKey};

/// An image whose last chunk has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedImage {
    pub key: ImageKey,
    /// Concatenated chunks, ready for the SSDV decoder.
    pub data: Bytes,
    pub packets: usize,
    /// When the first chunk arrived.
    pub started: DateTime<Utc>,
    /// Header of the last chunk received.
    pub header: ChunkHeader,
}

/// Snapshot of the image being received, for a progress decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub key: ImageKey,
    pub data: Bytes,
    pub packets: usize,
    pub header: ChunkHeader,
}

/// What a single chunk produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// The previous image, if this chunk started a new one.
    pub completed: Option<CompletedImage>,
    /// A progress snapshot, if the partial-update period came round.
    pub preview: Option<Preview>,
}

#[derive(Debug)]
struct Accumulator {
    key: ImageKey,
    buffer: BytesMut,
    packets: usize,
    started: DateTime<Utc>,
    last: ChunkHeader,
}

impl Accumulator {
    fn start(chunk: &ImageChunk) -> Self {
        let mut buffer = BytesMut::with_capacity(ImageChunk::LENGTH * 64);
        buffer.extend_from_slice(&chunk.data);
        Self {
            key: chunk.header.key(),
            buffer,
            packets: 1,
            started: Utc::now(),
            last: chunk.header.clone(),
        }
    }

    fn complete(self) -> CompletedImage {
        CompletedImage {
            key: self.key,
            data: self.buffer.freeze(),
            packets: self.packets,
            started: self.started,
            header: self.last,
        }
    }
}

/// Image reassembly state machine.
#[derive(Debug, Default)]
pub struct ImageReassembler {
    partial_update: usize,
    current: Option<Accumulator>,
}

impl ImageReassembler {
    /// `partial_update` > 0 requests a preview every that many chunks.
    pub fn new(partial_update: usize) -> Self {
        Self {
            partial_update,
            current: None,
        }
    }

    /// Key of the image currently being received.
    pub fn current_key(&self) -> Option<&ImageKey> {
        self.current.as_ref().map(|acc| &acc.key)
    }

    /// Chunks received for the current image.
    pub fn current_packets(&self) -> usize {
        self.current.as_ref().map_or(0, |acc| acc.packets)
    }

    pub fn push(&mut self, chunk: &ImageChunk) -> PushOutcome {
        let key = chunk.header.key();

        if let Some(acc) = self.current.as_mut().filter(|acc| acc.key == key) {
            acc.buffer.extend_from_slice(&chunk.data);
            acc.packets += 1;
            acc.last = chunk.header.clone();

            let preview = (self.partial_update > 0 && acc.packets % self.partial_update == 0)
                .then(|| Preview {
                    key: acc.key.clone(),
                    data: Bytes::copy_from_slice(&acc.buffer),
                    packets: acc.packets,
                    header: acc.last.clone(),
                });
            return PushOutcome {
                completed: None,
                preview,
            };
        }

        tracing::info!(image = %key, "new image");
        let completed = self
            .current
            .replace(Accumulator::start(chunk))
            .filter(|acc| acc.packets > 0)
            .map(Accumulator::complete);
        PushOutcome {
            completed,
            preview: None,
        }
    }

    /// Flush whatever is being accumulated, leaving the reassembler idle.
    pub fn finish(&mut self) -> Option<CompletedImage> {
        self.current
            .take()
            .filter(|acc| acc.packets > 0)
            .map(Accumulator::complete)
    }
}
