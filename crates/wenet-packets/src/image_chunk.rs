//! SSDV image chunks.
//!
//! Only the routing header is interpreted here. The rest of the packet
//! belongs to the image codec and is carried through untouched.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;
use crate::kind::PacketKind;
use crate::layout::fixed;

/// SSDV packet type byte for chunks carrying their own Reed-Solomon block.
pub const SSDV_TYPE_FEC: u8 = 0x66;

/// SSDV packet type byte for chunks without Reed-Solomon.
pub const SSDV_TYPE_NO_FEC: u8 = 0x67;

const CALLSIGN_ALPHABET: &[u8; 40] = b"-0123456789---ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longest callsign representable in 32 bits of base-40.
pub const MAX_CALLSIGN: usize = 6;

/// Decode a base-40 SSDV callsign, least significant digit first.
pub fn decode_callsign(mut code: u32) -> String {
    let mut callsign = String::new();
    while code != 0 {
        callsign.push(char::from(CALLSIGN_ALPHABET[(code % 40) as usize]));
        code /= 40;
    }
    callsign
}

/// Encode a callsign the way the SSDV encoder does.
///
/// At most [`MAX_CALLSIGN`] characters are used. Letters fold to upper case
/// and characters outside `0-9A-Z` encode as zero.
pub fn encode_callsign(callsign: &str) -> u32 {
    callsign
        .bytes()
        .take(MAX_CALLSIGN)
        .collect::<Vec<_>>()
        .iter()
        .rev()
        .fold(0u32, |code, &c| {
            let digit = match c.to_ascii_uppercase() {
                upper @ b'A'..=b'Z' => u32::from(upper - b'A') + 14,
                digit @ b'0'..=b'9' => u32::from(digit - b'0') + 1,
                _ => 0,
            };
            code * 40 + digit
        })
}

/// Routing fields at the front of every SSDV packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkHeader {
    /// Raw SSDV packet type byte.
    pub packet_type: u8,
    pub callsign: String,
    pub image_id: u8,
    pub packet_id: u16,
    /// Pixels.
    pub width: u16,
    /// Pixels.
    pub height: u16,
}

impl ChunkHeader {
    pub fn fec(&self) -> bool {
        self.packet_type == SSDV_TYPE_FEC
    }

    /// The (callsign, image id) pair that identifies one image.
    pub fn key(&self) -> ImageKey {
        ImageKey {
            callsign: self.callsign.clone(),
            image_id: self.image_id,
        }
    }
}

/// Identity of the image a chunk belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageKey {
    pub callsign: String,
    pub image_id: u8,
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.callsign, self.image_id)
    }
}

/// 0x55 SSDV image chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageChunk {
    #[serde(flatten)]
    pub header: ChunkHeader,
    #[serde(skip)]
    pub data: Bytes,
}

impl ImageChunk {
    pub const LENGTH: usize = 256;

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let packet = fixed(PacketKind::ImageChunk, packet, Self::LENGTH)?;
        let callsign = u32::from_be_bytes([packet[2], packet[3], packet[4], packet[5]]);

        Ok(Self {
            header: ChunkHeader {
                packet_type: packet[1],
                callsign: decode_callsign(callsign),
                image_id: packet[6],
                packet_id: u16::from_be_bytes([packet[7], packet[8]]),
                width: u16::from(packet[9]) * 16,
                height: u16::from(packet[10]) * 16,
            },
            data: Bytes::copy_from_slice(packet),
        })
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSDV: {}, Callsign: {}, Img:{}, Pkt:{}, {}x{}",
            if self.fec() { "FEC" } else { "No-FEC" },
            self.callsign,
            self.image_id,
            self.packet_id,
            self.width,
            self.height,
        )
    }
}

impl fmt::Display for ImageChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.header, f)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DecodeError;

    /// A 256-byte SSDV packet with the given routing fields.
    pub(crate) fn chunk(callsign: &str, image_id: u8, packet_id: u16) -> Vec<u8> {
        let mut packet = vec![0u8; ImageChunk::LENGTH];
        packet[0] = 0x55;
        packet[1] = SSDV_TYPE_FEC;
        packet[2..6].copy_from_slice(&encode_callsign(callsign).to_be_bytes());
        packet[6] = image_id;
        packet[7..9].copy_from_slice(&packet_id.to_be_bytes());
        packet[9] = 40;
        packet[10] = 30;
        packet
    }

    #[test]
    fn decodes_reference_callsign() {
        // "VK5QI" as produced by the SSDV encoder.
        let code = encode_callsign("VK5QI");
        assert_eq!(decode_callsign(code), "VK5QI");
        assert_eq!(decode_callsign(0), "");
    }

    #[test]
    fn callsign_roundtrips_alphanumerics() {
        for callsign in ["A", "N0CALL", "VK5ARG", "Z9Z9Z9", "123456"] {
            assert_eq!(decode_callsign(encode_callsign(callsign)), callsign);
        }
    }

    #[test]
    fn callsign_encoding_rules() {
        assert_eq!(encode_callsign("vk5qi"), encode_callsign("VK5QI"));
        assert_eq!(encode_callsign("ABCDEFGH"), encode_callsign("ABCDEF"));
        assert_eq!(encode_callsign("A"), 14);
        assert_eq!(encode_callsign("0"), 1);
        assert_eq!(encode_callsign("A0"), 14 + 40);
    }

    #[test]
    fn decodes_header() {
        let packet = chunk("VK5QI", 7, 0x0102);
        let decoded = ImageChunk::decode(&packet).unwrap();

        assert_eq!(decoded.header.callsign, "VK5QI");
        assert_eq!(decoded.header.image_id, 7);
        assert_eq!(decoded.header.packet_id, 258);
        assert_eq!(decoded.header.width, 640);
        assert_eq!(decoded.header.height, 480);
        assert!(decoded.header.fec());
        assert_eq!(decoded.data.as_ref(), packet.as_slice());
        assert_eq!(
            decoded.to_string(),
            "SSDV: FEC, Callsign: VK5QI, Img:7, Pkt:258, 640x480"
        );
    }

    #[test]
    fn no_fec_rendering() {
        let mut packet = chunk("N0CALL", 1, 0);
        packet[1] = SSDV_TYPE_NO_FEC;
        let decoded = ImageChunk::decode(&packet).unwrap();
        assert!(!decoded.header.fec());
        assert!(decoded.to_string().starts_with("SSDV: No-FEC"));
    }

    #[test]
    fn short_chunk_is_an_error() {
        let packet = chunk("VK5QI", 7, 1);
        assert_eq!(
            ImageChunk::decode(&packet[..100]).unwrap_err(),
            DecodeError::InvalidLength {
                kind: PacketKind::ImageChunk,
                expected: 256,
                actual: 100,
            }
        );
    }

    #[test]
    fn key_identifies_image() {
        let a = ImageChunk::decode(&chunk("VK5QI", 7, 1)).unwrap();
        let b = ImageChunk::decode(&chunk("VK5QI", 7, 2)).unwrap();
        let c = ImageChunk::decode(&chunk("VK5QI", 8, 0)).unwrap();
        assert_eq!(a.header.key(), b.header.key());
        assert_ne!(a.header.key(), c.header.key());
        assert_eq!(a.header.key().to_string(), "VK5QI#7");
    }
}
