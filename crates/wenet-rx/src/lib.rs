//! Receive side of the Wenet downlink.
//!
//! A [`ReceiveSession`] reads demodulated 256-byte packets, and its
//! [`Dispatcher`] routes them by type tag: telemetry is decoded and handed
//! to [`EventSink`]s, image chunks are reassembled into SSDV files and
//! decoded to JPEG by an [`ImageDecoder`].
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//!
//! use wenet_frame::PacketReader;
//! use wenet_rx::{Dispatcher, EventSink, ReceiveSession, RxConfig, SsdvCommand, TelemetryLog};
//!
//! let config = RxConfig::default();
//! let sinks: Vec<Box<dyn EventSink>> = vec![Box::new(TelemetryLog::new(&config.rx_images)?)];
//! let dispatcher = Dispatcher::new(&config, SsdvCommand::default(), sinks)?;
//!
//! let reader = PacketReader::new(std::io::stdin().lock());
//! let summary = ReceiveSession::new(reader, dispatcher).run(&AtomicBool::new(false))?;
//! println!("{} images", summary.stats.images);
//! # Ok::<(), wenet_rx::RxError>(())
//! ```

pub mod config;
pub mod decoder;
pub mod dispatcher;
mod error;
pub mod events;
pub mod reassembler;
pub mod session;
pub mod telemetry_log;

pub use config::{
    RxConfig, UdpConfig, DEFAULT_IMAGE_PORT, DEFAULT_RX_IMAGES, DEFAULT_TELEMETRY_PORT,
};
pub use decoder::{ImageDecoder, SsdvCommand};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{ImageDecodeError, Result, RxError};
pub use events::{ChannelSink, EventSink, RxEvent, UdpNotifier};
pub use reassembler::{CompletedImage, ImageReassembler, Preview, PushOutcome};
pub use session::{ReceiveSession, SessionEnd, SessionSummary};
pub use telemetry_log::TelemetryLog;
