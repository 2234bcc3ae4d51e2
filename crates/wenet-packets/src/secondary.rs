use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Serialize, Serializer};

use crate::error::{DecodeError, Result};
use crate::kind::{PacketKind, SECONDARY_PAYLOAD};
use crate::text::TextMessage;

/// 0x03 packet relayed for a secondary payload.
///
/// The body is opaque to the downlink; by convention it is itself a packet,
/// usually a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryPayload {
    pub id: u8,
    #[serde(serialize_with = "as_hex")]
    pub payload: Bytes,
}

fn as_hex<S: Serializer>(payload: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(payload))
}

impl SecondaryPayload {
    /// Largest body that fits after the tag and id.
    pub const MAX_PAYLOAD: usize = 254;

    pub fn new(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let kind = PacketKind::SecondaryPayload;
        let tag = *packet.first().ok_or(DecodeError::Empty)?;
        if tag != SECONDARY_PAYLOAD {
            return Err(DecodeError::UnexpectedTag {
                expected: kind,
                actual: tag,
            });
        }
        let id = *packet.get(1).ok_or(DecodeError::InvalidLength {
            kind,
            expected: 2,
            actual: packet.len(),
        })?;

        Ok(Self {
            id,
            payload: Bytes::copy_from_slice(&packet[2..]),
        })
    }

    /// Encode, clipping the body to [`Self::MAX_PAYLOAD`] bytes.
    pub fn encode(&self) -> Bytes {
        let body = &self.payload[..self.payload.len().min(Self::MAX_PAYLOAD)];
        let mut dst = BytesMut::with_capacity(2 + body.len());
        dst.put_u8(SECONDARY_PAYLOAD);
        dst.put_u8(self.id);
        dst.put_slice(body);
        dst.freeze()
    }

    /// Kind of the embedded packet, if there is one.
    pub fn embedded_kind(&self) -> Option<PacketKind> {
        PacketKind::of(&self.payload)
    }

    /// Decode the embedded packet as a text message.
    pub fn embedded_text(&self) -> Option<Result<TextMessage>> {
        match self.embedded_kind()? {
            PacketKind::TextMessage => Some(TextMessage::decode(&self.payload)),
            _ => None,
        }
    }
}

impl fmt::Display for SecondaryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secondary Payload Packet (ID: #{}) - ", self.id)?;
        match (self.embedded_kind(), self.embedded_text()) {
            (_, Some(Ok(message))) => write!(f, "{message}"),
            (_, Some(Err(_))) => write!(f, "Text: ERROR Could not decode."),
            (Some(kind), None) => write!(f, "Payload Type {}", kind.tag()),
            (None, None) => write!(f, "Empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_text_message() {
        let inner = TextMessage::new(3, "cutdown armed").encode();
        let wire = SecondaryPayload::new(9, inner.clone()).encode();

        assert_eq!(wire[0], SECONDARY_PAYLOAD);
        assert_eq!(wire[1], 9);
        assert_eq!(&wire[2..], inner.as_ref());

        let decoded = SecondaryPayload::decode(&wire).unwrap();
        assert_eq!(decoded.embedded_kind(), Some(PacketKind::TextMessage));
        assert_eq!(
            decoded.embedded_text().unwrap().unwrap(),
            TextMessage::new(3, "cutdown armed")
        );
        assert_eq!(
            decoded.to_string(),
            "Secondary Payload Packet (ID: #9) - Text Message #3: \tcutdown armed"
        );
    }

    #[test]
    fn opaque_payload_rendering() {
        let decoded = SecondaryPayload::decode(&[0x03, 1, 0x42, 0x01]).unwrap();
        assert!(decoded.embedded_text().is_none());
        assert_eq!(
            decoded.to_string(),
            "Secondary Payload Packet (ID: #1) - Payload Type 66"
        );
    }

    #[test]
    fn clips_to_254_bytes() {
        let wire = SecondaryPayload::new(2, vec![0xAA; 300]).encode();
        assert_eq!(wire.len(), 256);
    }

    #[test]
    fn missing_id_is_an_error() {
        assert!(matches!(
            SecondaryPayload::decode(&[0x03]),
            Err(DecodeError::InvalidLength { expected: 2, .. })
        ));
    }

    #[test]
    fn serializes_payload_as_hex() {
        let value = serde_json::to_value(SecondaryPayload::new(4, vec![0xde, 0xad])).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["payload"], "dead");
    }
}
