//! Typed payload codec for the Wenet downlink.
//!
//! Every packet is 256 bytes and carries a type tag in its first byte.
//! [`decode_packet`] dispatches on that tag; each kind also exposes its own
//! `decode`/`encode` pair.
//!
//! ```
//! use wenet_packets::{decode_packet, Packet, TextMessage};
//!
//! let wire = TextMessage::new(1, "hello").encode();
//! match decode_packet(&wire).unwrap() {
//!     Packet::Text(message) => assert_eq!(message.text, "hello"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod error;
pub mod gps;
pub mod gps_time;
pub mod image_chunk;
pub mod image_telemetry;
pub mod kind;
mod layout;
pub mod orientation;
mod packet;
pub mod secondary;
pub mod text;

pub use error::{DecodeError, Result};
pub use gps::{GpsTelemetry, Housekeeping};
pub use gps_time::{DynamicModel, FixState, GpsTime};
pub use image_chunk::{decode_callsign, encode_callsign, ChunkHeader, ImageChunk, ImageKey};
pub use image_telemetry::ImageTelemetry;
pub use kind::PacketKind;
pub use layout::{Attitude, Navigation};
pub use orientation::OrientationTelemetry;
pub use packet::{decode_packet, Packet};
pub use secondary::SecondaryPayload;
pub use text::TextMessage;

/// Size of every packet on the link.
pub const PACKET_SIZE: usize = 256;
