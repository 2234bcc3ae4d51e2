use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::{DecodeError, Result};
use crate::kind::{PacketKind, TEXT_MESSAGE};
use crate::layout::ascii;

/// 0x00 free-form text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessage {
    #[serde(rename = "id")]
    pub message_id: u16,
    pub text: String,
}

impl TextMessage {
    /// Tag, length and message id.
    pub const HEADER_LENGTH: usize = 4;

    /// Longest text that fits in one packet.
    pub const MAX_TEXT: usize = 252;

    pub fn new(message_id: u16, text: impl Into<String>) -> Self {
        Self {
            message_id,
            text: text.into(),
        }
    }

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let kind = PacketKind::TextMessage;
        let tag = *packet.first().ok_or(DecodeError::Empty)?;
        if tag != TEXT_MESSAGE {
            return Err(DecodeError::UnexpectedTag {
                expected: kind,
                actual: tag,
            });
        }
        if packet.len() < Self::HEADER_LENGTH {
            return Err(DecodeError::InvalidLength {
                kind,
                expected: Self::HEADER_LENGTH,
                actual: packet.len(),
            });
        }

        let length = usize::from(packet[1]);
        let message_id = u16::from_be_bytes([packet[2], packet[3]]);
        let end = Self::HEADER_LENGTH + length;
        let body = packet.get(Self::HEADER_LENGTH..end).ok_or(DecodeError::InvalidLength {
            kind,
            expected: end,
            actual: packet.len(),
        })?;

        Ok(Self {
            message_id,
            text: ascii(kind, body)?,
        })
    }

    /// Encode, clipping the text to [`Self::MAX_TEXT`] bytes.
    ///
    /// Non-ASCII characters are replaced with `?` so the packet always
    /// decodes.
    pub fn encode(&self) -> Bytes {
        let body: Vec<u8> = self
            .text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .take(Self::MAX_TEXT)
            .collect();

        let mut dst = BytesMut::with_capacity(Self::HEADER_LENGTH + body.len());
        dst.put_u8(TEXT_MESSAGE);
        dst.put_u8(body.len() as u8);
        dst.put_u16(self.message_id);
        dst.put_slice(&body);
        dst.freeze()
    }
}

impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text Message #{}: \t{}", self.message_id, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_and_text() {
        let wire = TextMessage::new(0x0102, "hello").encode();
        assert_eq!(wire.as_ref(), b"\x00\x05\x01\x02hello");
    }

    #[test]
    fn decodes_padded_packet() {
        let mut packet = TextMessage::new(7, "balloon up").encode().to_vec();
        packet.resize(256, 0x55);

        let message = TextMessage::decode(&packet).unwrap();
        assert_eq!(message, TextMessage::new(7, "balloon up"));
        assert_eq!(message.to_string(), "Text Message #7: \tballoon up");
    }

    #[test]
    fn clips_long_text() {
        let long = "x".repeat(400);
        let wire = TextMessage::new(1, long).encode();
        assert_eq!(wire.len(), 256);
        assert_eq!(wire[1], 252);
        assert_eq!(TextMessage::decode(&wire).unwrap().text.len(), 252);
    }

    #[test]
    fn missing_text_bytes_is_an_error() {
        let err = TextMessage::decode(b"\x00\x0a\x00\x01abc").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                kind: PacketKind::TextMessage,
                expected: 14,
                actual: 7,
            }
        );
        assert!(TextMessage::decode(b"\x00\x01").is_err());
    }

    #[test]
    fn non_ascii_is_an_error() {
        let err = TextMessage::decode(b"\x00\x02\x00\x01\xc3\xa9").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidText {
                kind: PacketKind::TextMessage
            }
        );
    }

    #[test]
    fn encode_replaces_non_ascii() {
        let wire = TextMessage::new(0, "73 é").encode();
        assert_eq!(&wire[4..], b"73 ?");
    }
}
