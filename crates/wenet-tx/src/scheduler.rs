//! Two-priority transmit scheduler.
//!
//! One frame goes out per cycle: the oldest telemetry frame if there is one,
//! otherwise the oldest image frame, otherwise the idle filler.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver};
use wenet_frame::{Framer, ParityEncoder};
use wenet_packets::kind::IDLE;

use crate::error::{Result, TxError};
use crate::queues::TransmitQueues;
use crate::radio::Radio;

/// Default telemetry queue depth.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 256;

/// Default image queue depth (about 1 MiB of image data).
pub const DEFAULT_IMAGE_CAPACITY: usize = 4096;

/// Default pause after transmitting an idle frame.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// Scheduler configuration.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Minimum time per cycle. Zero lets the blocking radio write pace the link.
    pub interval: Duration,
    /// Extra pause after an idle frame.
    pub idle_backoff: Duration,
    pub telemetry_capacity: usize,
    pub image_capacity: usize,
    /// Parity encoder; `None` sends frames without FEC.
    pub fec: Option<Arc<dyn ParityEncoder>>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            image_capacity: DEFAULT_IMAGE_CAPACITY,
            fec: None,
        }
    }
}

impl SchedulerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn with_capacities(mut self, telemetry: usize, image: usize) -> Self {
        self.telemetry_capacity = telemetry;
        self.image_capacity = image;
        self
    }

    pub fn with_fec(mut self, encoder: Arc<dyn ParityEncoder>) -> Self {
        self.fec = Some(encoder);
        self
    }

    fn framer(&self) -> Framer {
        match &self.fec {
            Some(encoder) => Framer::with_parity(Arc::clone(encoder)),
            None => Framer::new(),
        }
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("interval", &self.interval)
            .field("idle_backoff", &self.idle_backoff)
            .field("telemetry_capacity", &self.telemetry_capacity)
            .field("image_capacity", &self.image_capacity)
            .field("fec", &self.fec.is_some())
            .finish()
    }
}

/// Which queue a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueTag {
    Telemetry,
    Image,
    Idle,
}

/// A framed packet ready for the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitEntry {
    pub frame: Bytes,
    pub source: QueueTag,
}

/// Owns the queue receivers and the radio.
pub struct Scheduler<R: Radio> {
    radio: R,
    config: SchedulerConfig,
    telemetry: Receiver<Bytes>,
    image: Receiver<Bytes>,
    idle: Arc<RwLock<Bytes>>,
    queues: TransmitQueues,
}

impl<R: Radio> Scheduler<R> {
    /// Create a scheduler. `callsign` is used in idle beacon messages.
    pub fn new(radio: R, callsign: impl Into<String>, config: SchedulerConfig) -> Self {
        let framer = config.framer();
        let (telemetry_tx, telemetry) = bounded(config.telemetry_capacity);
        let (image_tx, image) = bounded(config.image_capacity);
        let idle = Arc::new(RwLock::new(framer.frame(&[IDLE; 256])));
        let queues = TransmitQueues::new(
            telemetry_tx,
            image_tx,
            framer,
            Arc::clone(&idle),
            callsign.into(),
        );

        Self {
            radio,
            config,
            telemetry,
            image,
            idle,
            queues,
        }
    }

    /// A producer handle. Clone it freely.
    pub fn queues(&self) -> TransmitQueues {
        self.queues.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Pick the next frame without transmitting it.
    pub fn next_entry(&self) -> TransmitEntry {
        if let Ok(frame) = self.telemetry.try_recv() {
            return TransmitEntry {
                frame,
                source: QueueTag::Telemetry,
            };
        }
        if let Ok(frame) = self.image.try_recv() {
            return TransmitEntry {
                frame,
                source: QueueTag::Image,
            };
        }
        let frame = self
            .idle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        TransmitEntry {
            frame,
            source: QueueTag::Idle,
        }
    }

    /// Run one cycle: transmit the next frame, then wait out the cadence.
    pub fn tick(&mut self) -> Result<QueueTag> {
        let started = Instant::now();
        let entry = self.next_entry();
        self.radio.transmit(&entry.frame)?;

        if let Some(rest) = self.config.interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
        if entry.source == QueueTag::Idle && !self.config.idle_backoff.is_zero() {
            thread::sleep(self.config.idle_backoff);
        }
        Ok(entry.source)
    }

    /// Cycle until `stop` is set, then shut the radio down.
    ///
    /// The flag is checked between frames; a frame in flight always completes.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        let mut result = Ok(());
        while !stop.load(Ordering::Relaxed) {
            if let Err(err) = self.tick() {
                tracing::error!(error = %err, "radio transmit failed");
                result = Err(err);
                break;
            }
        }
        tracing::debug!("transmit scheduler stopping");
        let shutdown = self.radio.shutdown();
        result.and(shutdown)
    }
}

impl<R: Radio + 'static> Scheduler<R> {
    /// Run the scheduler on its own thread.
    pub fn spawn(mut self) -> Result<SchedulerHandle<R>> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let queues = self.queues();

        let thread = thread::Builder::new()
            .name("wenet-tx".into())
            .spawn(move || {
                let result = self.run(&flag);
                (self.radio, result)
            })?;

        Ok(SchedulerHandle {
            stop,
            queues,
            thread: Some(thread),
        })
    }
}

type Joined<R> = (R, Result<()>);

/// Handle to a running scheduler thread.
pub struct SchedulerHandle<R: Radio> {
    stop: Arc<AtomicBool>,
    queues: TransmitQueues,
    thread: Option<thread::JoinHandle<Joined<R>>>,
}

impl<R: Radio> SchedulerHandle<R> {
    pub fn queues(&self) -> TransmitQueues {
        self.queues.clone()
    }

    /// Shared stop flag, e.g. for a Ctrl-C handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ask the scheduler to stop after the frame in flight.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|thread| thread.is_finished())
    }

    /// Wait for the scheduler thread and hand back the radio.
    pub fn join(mut self) -> Result<R> {
        let thread = self.thread.take().ok_or(TxError::SchedulerPanicked)?;
        let (radio, result) = thread.join().map_err(|_| TxError::SchedulerPanicked)?;
        result.map(|()| radio)
    }
}

impl<R: Radio> Drop for SchedulerHandle<R> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.stop();
            let _ = thread.join();
        }
    }
}
