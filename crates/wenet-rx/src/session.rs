//! Receive loop: packet stream in, dispatcher events out.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use wenet_frame::{FrameError, PacketReader};

use crate::decoder::ImageDecoder;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::Result;
use crate::events::EventSink;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The packet stream closed.
    Eof,
    /// The stop flag was raised.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub end: SessionEnd,
    /// Input lines that were not valid hex.
    pub read_errors: u64,
    #[serde(flatten)]
    pub stats: DispatchStats,
}

pub struct ReceiveSession<R, D, S> {
    reader: PacketReader<R>,
    dispatcher: Dispatcher<D, S>,
    read_errors: u64,
}

impl<R: Read, D: ImageDecoder, S: EventSink> ReceiveSession<R, D, S> {
    pub fn new(reader: PacketReader<R>, dispatcher: Dispatcher<D, S>) -> Self {
        Self {
            reader,
            dispatcher,
            read_errors: 0,
        }
    }

    /// Dispatch packets until the stream closes or `stop` is set, then flush
    /// the image in progress.
    ///
    /// `stop` is checked between packets. Bad hex lines are logged and
    /// skipped; any other read error ends the session with an error, after
    /// the flush.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<SessionSummary> {
        let outcome = self.pump(stop);
        self.dispatcher.finish();

        let end = outcome?;
        let summary = SessionSummary {
            end,
            read_errors: self.read_errors,
            stats: self.dispatcher.stats(),
        };
        tracing::info!(?summary, "receive session ended");
        Ok(summary)
    }

    fn pump(&mut self, stop: &AtomicBool) -> Result<SessionEnd> {
        loop {
            if stop.load(Ordering::Relaxed) {
                return Ok(SessionEnd::Stopped);
            }
            match self.reader.read_packet() {
                Ok(packet) => self.dispatcher.handle(&packet),
                Err(FrameError::ConnectionClosed) => {
                    tracing::info!("packet stream closed");
                    return Ok(SessionEnd::Eof);
                }
                Err(err @ FrameError::InvalidHex { .. }) => {
                    tracing::warn!(error = %err, "skipping input line");
                    self.read_errors += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<D, S> {
        &self.dispatcher
    }

    pub fn into_dispatcher(self) -> Dispatcher<D, S> {
        self.dispatcher
    }
}
