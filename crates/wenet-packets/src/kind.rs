//! Packet type tags.
//!
//! The first byte of every 256-byte packet selects its layout.

use std::fmt;

use serde::Serialize;

/// Free-form ASCII text.
pub const TEXT_MESSAGE: u8 = 0x00;

/// GPS fix plus payload housekeeping.
pub const GPS_TELEMETRY: u8 = 0x01;

/// IMU orientation.
pub const ORIENTATION_TELEMETRY: u8 = 0x02;

/// Packet relayed on behalf of a secondary payload.
pub const SECONDARY_PAYLOAD: u8 = 0x03;

/// Combined GPS + orientation snapshot tied to an image id.
pub const IMAGE_TELEMETRY: u8 = 0x54;

/// SSDV image chunk. Shares its value with the SSDV sync byte.
pub const IMAGE_CHUNK: u8 = 0x55;

/// Idle filler.
pub const IDLE: u8 = 0x56;

/// The closed set of packet kinds, plus an explicit unknown case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    TextMessage,
    GpsTelemetry,
    OrientationTelemetry,
    SecondaryPayload,
    ImageTelemetry,
    ImageChunk,
    Idle,
    Unknown(u8),
}

impl PacketKind {
    /// Classify a type tag.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TEXT_MESSAGE => Self::TextMessage,
            GPS_TELEMETRY => Self::GpsTelemetry,
            ORIENTATION_TELEMETRY => Self::OrientationTelemetry,
            SECONDARY_PAYLOAD => Self::SecondaryPayload,
            IMAGE_TELEMETRY => Self::ImageTelemetry,
            IMAGE_CHUNK => Self::ImageChunk,
            IDLE => Self::Idle,
            other => Self::Unknown(other),
        }
    }

    /// Classify a packet by its first byte. `None` for an empty packet.
    pub fn of(packet: &[u8]) -> Option<Self> {
        packet.first().map(|&tag| Self::from_tag(tag))
    }

    /// The wire tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::TextMessage => TEXT_MESSAGE,
            Self::GpsTelemetry => GPS_TELEMETRY,
            Self::OrientationTelemetry => ORIENTATION_TELEMETRY,
            Self::SecondaryPayload => SECONDARY_PAYLOAD,
            Self::ImageTelemetry => IMAGE_TELEMETRY,
            Self::ImageChunk => IMAGE_CHUNK,
            Self::Idle => IDLE,
            Self::Unknown(tag) => tag,
        }
    }

    /// Declared length for fixed-layout kinds.
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            Self::GpsTelemetry => Some(crate::gps::GpsTelemetry::LENGTH),
            Self::OrientationTelemetry => Some(crate::orientation::OrientationTelemetry::LENGTH),
            Self::ImageTelemetry => Some(crate::image_telemetry::ImageTelemetry::LENGTH),
            Self::ImageChunk | Self::Idle => Some(crate::image_chunk::ImageChunk::LENGTH),
            Self::TextMessage | Self::SecondaryPayload | Self::Unknown(_) => None,
        }
    }

    /// Short name used in logs and log-file suffixes.
    pub fn name(self) -> &'static str {
        match self {
            Self::TextMessage => "text",
            Self::GpsTelemetry => "gps",
            Self::OrientationTelemetry => "orientation",
            Self::SecondaryPayload => "secondary",
            Self::ImageTelemetry => "imagetelem",
            Self::ImageChunk => "ssdv",
            Self::Idle => "idle",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns true for kinds routed through the telemetry path.
    pub fn is_telemetry(self) -> bool {
        matches!(
            self,
            Self::TextMessage
                | Self::GpsTelemetry
                | Self::OrientationTelemetry
                | Self::SecondaryPayload
                | Self::ImageTelemetry
        )
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextMessage => write!(f, "Text Message"),
            Self::GpsTelemetry => write!(f, "GPS Telemetry"),
            Self::OrientationTelemetry => write!(f, "Orientation Telemetry"),
            Self::SecondaryPayload => write!(f, "Secondary Payload"),
            Self::ImageTelemetry => write!(f, "Image Telemetry"),
            Self::ImageChunk => write!(f, "SSDV"),
            Self::Idle => write!(f, "Idle"),
            Self::Unknown(tag) => write!(f, "Unknown (0x{tag:02X})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for tag in 0..=255u8 {
            assert_eq!(PacketKind::from_tag(tag).tag(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_explicit() {
        assert_eq!(PacketKind::from_tag(0x99), PacketKind::Unknown(0x99));
        assert_eq!(PacketKind::of(&[]), None);
        assert!(!PacketKind::Unknown(0x99).is_telemetry());
    }

    #[test]
    fn declared_lengths() {
        assert_eq!(PacketKind::GpsTelemetry.fixed_length(), Some(73));
        assert_eq!(PacketKind::OrientationTelemetry.fixed_length(), Some(43));
        assert_eq!(PacketKind::ImageTelemetry.fixed_length(), Some(80));
        assert_eq!(PacketKind::ImageChunk.fixed_length(), Some(256));
        assert_eq!(PacketKind::TextMessage.fixed_length(), None);
    }
}
