use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::Sender;
use wenet_frame::{Framer, PAYLOAD_SIZE};
use wenet_packets::{
    Attitude, GpsTelemetry, GpsTime, Housekeeping, ImageTelemetry, Navigation,
    OrientationTelemetry, SecondaryPayload, TextMessage,
};

use crate::error::{Result, TxError};

const QUEUE_POLL: Duration = Duration::from_millis(10);

/// Producer handle for the transmit queues.
///
/// Cheap to clone and safe to share between threads. Payloads are framed on
/// the producer's thread; enqueueing blocks while the target queue is full.
#[derive(Clone)]
pub struct TransmitQueues {
    telemetry: Sender<Bytes>,
    image: Sender<Bytes>,
    framer: Framer,
    idle: Arc<RwLock<Bytes>>,
    callsign: Arc<str>,
    text_counter: Arc<AtomicU16>,
    image_telemetry_counter: Arc<AtomicU16>,
}

impl TransmitQueues {
    pub(crate) fn new(
        telemetry: Sender<Bytes>,
        image: Sender<Bytes>,
        framer: Framer,
        idle: Arc<RwLock<Bytes>>,
        callsign: String,
    ) -> Self {
        Self {
            telemetry,
            image,
            framer,
            idle,
            callsign: callsign.into(),
            text_counter: Arc::new(AtomicU16::new(0)),
            image_telemetry_counter: Arc::new(AtomicU16::new(0)),
        }
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// Frame `payload` and queue it `repeats` times on the telemetry queue.
    pub fn queue_telemetry(&self, payload: &[u8], repeats: usize) -> Result<()> {
        let frame = self.framer.frame(payload);
        for _ in 0..repeats {
            self.telemetry
                .send(frame.clone())
                .map_err(|_| TxError::QueueClosed)?;
        }
        Ok(())
    }

    /// Frame `payload` and queue it on the image queue.
    pub fn queue_image(&self, payload: &[u8]) -> Result<()> {
        self.image
            .send(self.framer.frame(payload))
            .map_err(|_| TxError::QueueClosed)
    }

    /// Queue an SSDV file 256 bytes at a time. Returns the packet count.
    ///
    /// A trailing partial packet is dropped.
    pub fn queue_image_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let chunks = data.chunks_exact(PAYLOAD_SIZE);
        let remainder = chunks.remainder().len();
        let mut queued = 0usize;

        for chunk in chunks {
            self.queue_image(chunk)?;
            queued += 1;
        }

        if remainder > 0 {
            tracing::warn!(
                path = %path.display(),
                bytes = remainder,
                "dropping trailing partial image packet"
            );
        }
        tracing::info!(path = %path.display(), packets = queued, "queued image file");
        Ok(queued)
    }

    pub fn telemetry_queue_empty(&self) -> bool {
        self.telemetry.is_empty()
    }

    pub fn image_queue_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn image_queue_len(&self) -> usize {
        self.image.len()
    }

    /// Block until the image queue has drained.
    pub fn wait_image_queue_empty(&self) {
        while !self.image.is_empty() {
            thread::sleep(QUEUE_POLL);
        }
    }

    /// Replace the idle filler with a "DE <callsign>" beacon text.
    pub fn set_idle_message(&self, text: &str) {
        let message = TextMessage::new(0, format!("DE {}: \t{}", self.callsign, text));
        let frame = self.framer.frame(&message.encode());
        *self.idle.write().unwrap_or_else(PoisonError::into_inner) = frame;
    }

    /// Queue a text message. Returns the message id used.
    pub fn transmit_text_message(&self, text: &str, repeats: usize) -> Result<u16> {
        let id = next(&self.text_counter);
        let message = TextMessage::new(id, text);
        self.queue_telemetry(&message.encode(), repeats)?;
        tracing::info!(id, text = %message.text, "queued text message");
        Ok(id)
    }

    pub fn transmit_gps_telemetry(
        &self,
        time: GpsTime,
        navigation: Navigation,
        housekeeping: Housekeeping,
    ) -> Result<()> {
        let packet = GpsTelemetry {
            time,
            navigation,
            housekeeping,
        };
        self.queue_telemetry(&packet.encode(), 1)
    }

    pub fn transmit_orientation_telemetry(&self, time: GpsTime, attitude: Attitude) -> Result<()> {
        let packet = OrientationTelemetry { time, attitude };
        self.queue_telemetry(&packet.encode(), 1)
    }

    /// Queue an image telemetry snapshot. Returns the sequence number used.
    pub fn transmit_image_telemetry(
        &self,
        image_id: u8,
        time: GpsTime,
        navigation: Navigation,
        attitude: Attitude,
        repeats: usize,
    ) -> Result<u16> {
        let sequence_number = next(&self.image_telemetry_counter);
        let packet = ImageTelemetry {
            sequence_number,
            callsign: self.callsign.to_string(),
            image_id,
            time,
            navigation,
            attitude,
        };
        self.queue_telemetry(&packet.encode(), repeats)?;
        Ok(sequence_number)
    }

    /// Relay a packet for a secondary payload. Data beyond 254 bytes is clipped.
    pub fn transmit_secondary_payload(&self, id: u8, data: &[u8], repeats: usize) -> Result<()> {
        let packet = SecondaryPayload::new(id, Bytes::copy_from_slice(data));
        self.queue_telemetry(&packet.encode(), repeats)
    }
}

/// Pre-increment a wrapping 16-bit counter.
fn next(counter: &AtomicU16) -> u16 {
    counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}
