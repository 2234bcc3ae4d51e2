use std::fmt;

use serde::Serialize;

use crate::error::{DecodeError, Result};
use crate::gps::GpsTelemetry;
use crate::image_chunk::ImageChunk;
use crate::image_telemetry::ImageTelemetry;
use crate::kind::PacketKind;
use crate::orientation::OrientationTelemetry;
use crate::secondary::SecondaryPayload;
use crate::text::TextMessage;

/// A decoded packet of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Packet {
    Text(TextMessage),
    Gps(GpsTelemetry),
    Orientation(OrientationTelemetry),
    Secondary(SecondaryPayload),
    ImageTelemetry(ImageTelemetry),
    ImageChunk(ImageChunk),
    Idle,
    Unknown { tag: u8 },
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Text(_) => PacketKind::TextMessage,
            Self::Gps(_) => PacketKind::GpsTelemetry,
            Self::Orientation(_) => PacketKind::OrientationTelemetry,
            Self::Secondary(_) => PacketKind::SecondaryPayload,
            Self::ImageTelemetry(_) => PacketKind::ImageTelemetry,
            Self::ImageChunk(_) => PacketKind::ImageChunk,
            Self::Idle => PacketKind::Idle,
            Self::Unknown { tag } => PacketKind::Unknown(*tag),
        }
    }
}

/// Decode a packet by its type tag.
///
/// Unknown tags are not an error; they come back as [`Packet::Unknown`].
pub fn decode_packet(packet: &[u8]) -> Result<Packet> {
    let kind = PacketKind::of(packet).ok_or(DecodeError::Empty)?;
    let decoded = match kind {
        PacketKind::TextMessage => Packet::Text(TextMessage::decode(packet)?),
        PacketKind::GpsTelemetry => Packet::Gps(GpsTelemetry::decode(packet)?),
        PacketKind::OrientationTelemetry => {
            Packet::Orientation(OrientationTelemetry::decode(packet)?)
        }
        PacketKind::SecondaryPayload => Packet::Secondary(SecondaryPayload::decode(packet)?),
        PacketKind::ImageTelemetry => Packet::ImageTelemetry(ImageTelemetry::decode(packet)?),
        PacketKind::ImageChunk => Packet::ImageChunk(ImageChunk::decode(packet)?),
        PacketKind::Idle => Packet::Idle,
        PacketKind::Unknown(tag) => Packet::Unknown { tag },
    };
    Ok(decoded)
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(message) => fmt::Display::fmt(message, f),
            Self::Gps(gps) => fmt::Display::fmt(gps, f),
            Self::Orientation(orientation) => fmt::Display::fmt(orientation, f),
            Self::Secondary(secondary) => fmt::Display::fmt(secondary, f),
            Self::ImageTelemetry(telemetry) => fmt::Display::fmt(telemetry, f),
            Self::ImageChunk(chunk) => fmt::Display::fmt(chunk, f),
            Self::Idle => f.write_str("Idle"),
            Self::Unknown { tag } => write!(f, "Unknown Packet Type: {tag}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps_time::GpsTime;
    use crate::image_chunk::tests::chunk;

    fn padded(bytes: &[u8]) -> Vec<u8> {
        let mut packet = bytes.to_vec();
        packet.resize(256, 0x55);
        packet
    }

    #[test]
    fn dispatches_on_tag() {
        let text = padded(&TextMessage::new(1, "hi").encode());
        assert!(matches!(decode_packet(&text).unwrap(), Packet::Text(_)));

        let gps = padded(&GpsTelemetry::default().encode());
        assert_eq!(decode_packet(&gps).unwrap().kind(), PacketKind::GpsTelemetry);

        let orientation = padded(&OrientationTelemetry::default().encode());
        assert_eq!(
            decode_packet(&orientation).unwrap().kind(),
            PacketKind::OrientationTelemetry
        );

        let secondary = padded(&SecondaryPayload::new(1, vec![0x00]).encode());
        assert_eq!(
            decode_packet(&secondary).unwrap().kind(),
            PacketKind::SecondaryPayload
        );

        let image_telemetry = padded(&ImageTelemetry::default().encode());
        assert_eq!(
            decode_packet(&image_telemetry).unwrap().kind(),
            PacketKind::ImageTelemetry
        );

        let image = chunk("VK5QI", 1, 0);
        assert_eq!(decode_packet(&image).unwrap().kind(), PacketKind::ImageChunk);

        assert_eq!(decode_packet(&[0x56; 256]).unwrap(), Packet::Idle);
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        let packet = decode_packet(&padded(&[0x99])).unwrap();
        assert_eq!(packet, Packet::Unknown { tag: 0x99 });
        assert_eq!(packet.to_string(), "Unknown Packet Type: 153");
    }

    #[test]
    fn empty_and_short_packets_are_errors() {
        assert_eq!(decode_packet(&[]).unwrap_err(), DecodeError::Empty);

        let gps = GpsTelemetry::default().encode();
        assert!(matches!(
            decode_packet(&gps[..40]).unwrap_err(),
            DecodeError::InvalidLength {
                kind: PacketKind::GpsTelemetry,
                expected: 73,
                actual: 40
            }
        ));
    }

    #[test]
    fn over_length_input_is_truncated() {
        let gps = GpsTelemetry {
            time: GpsTime::new(2000, 1, 18),
            ..GpsTelemetry::default()
        };
        let mut long = gps.encode().to_vec();
        long.extend_from_slice(&[0xFF; 500]);
        assert_eq!(decode_packet(&long).unwrap(), Packet::Gps(gps));
    }

    #[test]
    fn serializes_with_type_tag() {
        let value = serde_json::to_value(Packet::Text(TextMessage::new(2, "ok"))).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["id"], 2);
        assert_eq!(value["text"], "ok");

        let value = serde_json::to_value(Packet::Unknown { tag: 7 }).unwrap();
        assert_eq!(value["type"], "unknown");
        assert_eq!(value["tag"], 7);
    }

    #[test]
    fn never_panics_on_arbitrary_prefixes() {
        let sources = [
            padded(&GpsTelemetry::default().encode()),
            padded(&OrientationTelemetry::default().encode()),
            padded(&ImageTelemetry::default().encode()),
            padded(&TextMessage::new(1, "abc").encode()),
            chunk("N0CALL", 3, 9),
        ];
        for source in &sources {
            for len in 0..=source.len() {
                let _ = decode_packet(&source[..len]);
            }
        }
    }
}
