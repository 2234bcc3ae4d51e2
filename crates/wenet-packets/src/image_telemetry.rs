use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::Result;
use crate::gps_time::GpsTime;
use crate::kind::{PacketKind, IMAGE_TELEMETRY};
use crate::layout::{ascii, fixed, get_gps_time, put_gps_time, Attitude, Navigation};

/// Width of the Pascal-string callsign field, including its length byte.
const CALLSIGN_FIELD: usize = 7;

/// Longest callsign the field can hold.
pub const MAX_CALLSIGN: usize = CALLSIGN_FIELD - 1;

/// 0x54 GPS and orientation snapshot taken when an image was captured.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImageTelemetry {
    pub sequence_number: u16,
    pub callsign: String,
    pub image_id: u8,
    #[serde(flatten)]
    pub time: GpsTime,
    #[serde(flatten)]
    pub navigation: Navigation,
    #[serde(flatten)]
    pub attitude: Attitude,
}

impl ImageTelemetry {
    pub const LENGTH: usize = 80;

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut buf = fixed(PacketKind::ImageTelemetry, packet, Self::LENGTH)?;
        buf.advance(1);

        let sequence_number = buf.get_u16();
        let field = &buf[..CALLSIGN_FIELD];
        let length = usize::from(field[0]).min(MAX_CALLSIGN);
        let callsign = ascii(PacketKind::ImageTelemetry, &field[1..=length])?;
        buf.advance(CALLSIGN_FIELD);

        Ok(Self {
            sequence_number,
            callsign,
            image_id: buf.get_u8(),
            time: get_gps_time(&mut buf),
            navigation: Navigation::get(&mut buf),
            attitude: Attitude::get(&mut buf),
        })
    }

    /// Encode, clipping the callsign to [`MAX_CALLSIGN`] characters.
    /// Non-ASCII characters are sent as `?`.
    pub fn encode(&self) -> Bytes {
        let mut field = [0u8; CALLSIGN_FIELD];
        let mut length = 0;
        for (slot, c) in field[1..].iter_mut().zip(self.callsign.chars()) {
            *slot = if c.is_ascii() { c as u8 } else { b'?' };
            length += 1;
        }
        field[0] = length as u8;

        let mut dst = BytesMut::with_capacity(Self::LENGTH);
        dst.put_u8(IMAGE_TELEMETRY);
        dst.put_u16(self.sequence_number);
        dst.put_slice(&field);
        dst.put_u8(self.image_id);
        put_gps_time(&mut dst, &self.time);
        self.navigation.put(&mut dst);
        self.attitude.put(&mut dst);
        dst.freeze()
    }
}

impl fmt::Display for ImageTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Image Telemetry: {} ID #{}, {} Lat/Lon: {:.5},{:.5} Alt: {} m Fix: {} Euler: ({:.1},{:.1},{:.1})",
            self.callsign,
            self.image_id,
            self.time.to_utc().format("%Y-%m-%dT%H:%M:%S%.f"),
            self.navigation.latitude,
            self.navigation.longitude,
            self.navigation.altitude as i32,
            self.navigation.fix,
            self.attitude.euler_heading,
            self.attitude.euler_roll,
            self.attitude.euler_pitch,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps_time::FixState;

    fn sample() -> ImageTelemetry {
        ImageTelemetry {
            sequence_number: 513,
            callsign: "VK5QI".to_string(),
            image_id: 42,
            time: GpsTime::new(2290, 200_000, 18),
            navigation: Navigation {
                latitude: -34.5,
                longitude: 138.5,
                altitude: 31_000.0,
                fix: FixState::Fix3D,
                num_sv: 9,
                ..Navigation::default()
            },
            attitude: Attitude {
                euler_heading: 90.0,
                euler_roll: 1.5,
                euler_pitch: -3.0,
                temp: 20,
                ..Attitude::default()
            },
        }
    }

    #[test]
    fn layout() {
        let wire = sample().encode();
        assert_eq!(wire.len(), ImageTelemetry::LENGTH);
        assert_eq!(wire[0], IMAGE_TELEMETRY);
        assert_eq!(&wire[1..3], &[0x02, 0x01]);
        assert_eq!(&wire[3..10], b"\x05VK5QI\x00");
        assert_eq!(wire[10], 42);
        assert_eq!(&wire[11..13], &2290u16.to_be_bytes());
    }

    #[test]
    fn non_ascii_callsign_still_decodes() {
        let telemetry = ImageTelemetry {
            callsign: "VK5é".to_string(),
            ..sample()
        };
        let wire = telemetry.encode();
        assert_eq!(&wire[3..8], b"\x04VK5?");

        let decoded = ImageTelemetry::decode(&wire).unwrap();
        assert_eq!(decoded.callsign, "VK5?");
        assert_eq!(decoded.image_id, 42);
    }

    #[test]
    fn decodes_padded_packet() {
        let mut packet = sample().encode().to_vec();
        packet.resize(256, 0x55);
        assert_eq!(ImageTelemetry::decode(&packet).unwrap(), sample());
    }

    #[test]
    fn callsign_is_clipped() {
        let telemetry = ImageTelemetry {
            callsign: "VK5QI-LONG".to_string(),
            ..sample()
        };
        let decoded = ImageTelemetry::decode(&telemetry.encode()).unwrap();
        assert_eq!(decoded.callsign, "VK5QI-");
    }

    #[test]
    fn oversized_length_byte_is_capped() {
        let mut wire = sample().encode().to_vec();
        wire[3] = 200;
        wire[9] = b'X';
        assert_eq!(ImageTelemetry::decode(&wire).unwrap().callsign, "VK5QIX");
    }

    #[test]
    fn short_packet_is_an_error() {
        let wire = sample().encode();
        assert!(ImageTelemetry::decode(&wire[..79]).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(
            sample().to_string(),
            "Image Telemetry: VK5QI ID #42, 2023-11-26T00:03:02 Lat/Lon: -34.50000,138.50000 \
             Alt: 31000 m Fix: 3D Fix Euler: (90.0,1.5,-3.0)"
        );
    }
}
