//! Transmit side of the Wenet downlink.
//!
//! A [`Scheduler`] owns the radio and two bounded queues. Producers get a
//! cloneable [`TransmitQueues`] handle, frame their payloads on their own
//! thread and enqueue them; telemetry always goes out before image data,
//! and an idle frame fills the gaps.
//!
//! ```no_run
//! use wenet_tx::{Scheduler, SchedulerConfig, WriterRadio};
//!
//! let serial = std::fs::OpenOptions::new().write(true).open("/dev/ttyAMA0")?;
//! let handle = Scheduler::new(WriterRadio::new(serial), "N0CALL", SchedulerConfig::default())
//!     .spawn()?;
//!
//! let queues = handle.queues();
//! queues.transmit_text_message("hello from the stratosphere", 1)?;
//! queues.queue_image_file("image.ssdv")?;
//! queues.wait_image_queue_empty();
//!
//! handle.stop();
//! handle.join()?;
//! # Ok::<(), wenet_tx::TxError>(())
//! ```

pub mod command;
mod error;
pub mod host;
mod queues;
pub mod radio;
pub mod scheduler;

pub use command::{CommandListener, UdpCommand, DEFAULT_COMMAND_PORT};
pub use error::{Result, TxError};
pub use host::{CameraState, HostStats};
pub use queues::TransmitQueues;
pub use radio::{BitDumpRadio, Radio, WriterRadio};
pub use scheduler::{QueueTag, Scheduler, SchedulerConfig, SchedulerHandle, TransmitEntry};
