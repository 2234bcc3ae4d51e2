//! UDP command listener.
//!
//! Other processes on the payload inject telemetry by sending small JSON
//! datagrams:
//!
//! ```text
//! {"type": "WENET_TX_TEXT", "packet": "hello"}
//! {"type": "WENET_TX_SEC_PAYLOAD", "id": 2, "packet": [0, 3, 0, 1, 97, 98, 99], "repeats": 2}
//! ```

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::queues::TransmitQueues;

/// Default command port.
pub const DEFAULT_COMMAND_PORT: u16 = 55674;

/// Receive timeout; bounds how long a stop request can go unnoticed.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

const MAX_DATAGRAM: usize = 4096;

/// A decoded command datagram.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum UdpCommand {
    #[serde(rename = "WENET_TX_TEXT")]
    Text { packet: String },

    #[serde(rename = "WENET_TX_SEC_PAYLOAD")]
    SecondaryPayload {
        id: i64,
        packet: Vec<u8>,
        #[serde(default = "default_repeats")]
        repeats: usize,
    },

    #[serde(other)]
    Unsupported,
}

fn default_repeats() -> usize {
    1
}

impl UdpCommand {
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(datagram)?)
    }

    /// Queue the packet this command asks for.
    pub fn apply(&self, queues: &TransmitQueues) -> Result<()> {
        match self {
            Self::Text { packet } => {
                queues.transmit_text_message(packet, 1)?;
            }
            Self::SecondaryPayload {
                id,
                packet,
                repeats,
            } => {
                let id = id.rem_euclid(256) as u8;
                queues.transmit_secondary_payload(id, packet, *repeats)?;
            }
            Self::Unsupported => {}
        }
        Ok(())
    }
}

/// Listens for command datagrams and feeds them to the telemetry queue.
pub struct CommandListener {
    socket: UdpSocket,
    queues: TransmitQueues,
}

impl CommandListener {
    /// Bind on all interfaces.
    pub fn bind(port: u16, queues: TransmitQueues) -> Result<Self> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)), queues)
    }

    pub fn bind_addr(addr: SocketAddr, queues: TransmitQueues) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        tracing::info!(addr = %socket.local_addr()?, "udp command listener started");
        Ok(Self { socket, queues })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle one datagram. Malformed input is logged and ignored.
    pub fn handle_datagram(&self, datagram: &[u8]) -> Option<UdpCommand> {
        match UdpCommand::parse(datagram) {
            Ok(command) => {
                if let Err(err) = command.apply(&self.queues) {
                    tracing::warn!(error = %err, "could not queue udp command");
                }
                Some(command)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not parse udp command");
                None
            }
        }
    }

    /// Receive until `stop` is set.
    pub fn run(&self, stop: &AtomicBool) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM];
        while !stop.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    tracing::debug!(%from, len, "udp command received");
                    self.handle_datagram(&buf[..len]);
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) => {}
                Err(err) => return Err(err.into()),
            }
        }
        tracing::info!("udp command listener stopped");
        Ok(())
    }

    /// Run on a background thread.
    pub fn spawn(self, stop: Arc<AtomicBool>) -> Result<thread::JoinHandle<Result<()>>> {
        Ok(thread::Builder::new()
            .name("wenet-udp".into())
            .spawn(move || self.run(&stop))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::WriterRadio;
    use crate::scheduler::{QueueTag, Scheduler, SchedulerConfig};
    use wenet_frame::decode_frame;
    use wenet_packets::{decode_packet, Packet};

    fn scheduler() -> Scheduler<WriterRadio<Vec<u8>>> {
        Scheduler::new(WriterRadio::new(Vec::new()), "N0CALL", SchedulerConfig::default())
    }

    #[test]
    fn parses_text_command() {
        let command = UdpCommand::parse(br#"{"type":"WENET_TX_TEXT","packet":"hi"}"#).unwrap();
        assert_eq!(
            command,
            UdpCommand::Text {
                packet: "hi".into()
            }
        );
    }

    #[test]
    fn parses_secondary_payload_with_default_repeats() {
        let command =
            UdpCommand::parse(br#"{"type":"WENET_TX_SEC_PAYLOAD","id":3,"packet":[1,2]}"#)
                .unwrap();
        assert_eq!(
            command,
            UdpCommand::SecondaryPayload {
                id: 3,
                packet: vec![1, 2],
                repeats: 1
            }
        );
    }

    #[test]
    fn unknown_type_is_ignored() {
        let command = UdpCommand::parse(br#"{"type":"WENET_RX_SOMETHING","x":1}"#).unwrap();
        assert_eq!(command, UdpCommand::Unsupported);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(UdpCommand::parse(b"{not json").is_err());
        assert!(UdpCommand::parse(br#"{"type":"WENET_TX_TEXT"}"#).is_err());
    }

    #[test]
    fn secondary_id_wraps_to_a_byte() {
        let scheduler = scheduler();
        let command = UdpCommand::SecondaryPayload {
            id: 258,
            packet: vec![0x42],
            repeats: 1,
        };
        command.apply(&scheduler.queues()).unwrap();

        let payload = decode_frame(&scheduler.next_entry().frame).unwrap().payload;
        match decode_packet(&payload).unwrap() {
            Packet::Secondary(secondary) => assert_eq!(secondary.id, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn listener_queues_datagrams() {
        let scheduler = scheduler();
        let listener =
            CommandListener::bind_addr("127.0.0.1:0".parse().unwrap(), scheduler.queues()).unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = listener.spawn(Arc::clone(&stop)).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(br#"{"type":"WENET_TX_TEXT","packet":"over udp"}"#, addr)
            .unwrap();

        let queues = scheduler.queues();
        for _ in 0..200 {
            if !queues.telemetry_queue_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        stop.store(true, Ordering::Relaxed);
        worker.join().unwrap().unwrap();

        let entry = scheduler.next_entry();
        assert_eq!(entry.source, QueueTag::Telemetry);
        let payload = decode_frame(&entry.frame).unwrap().payload;
        match decode_packet(&payload).unwrap() {
            Packet::Text(message) => assert_eq!(message.text, "over udp"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
