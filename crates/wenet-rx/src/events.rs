//! Receive events and the sinks that consume them.
//!
//! The dispatcher never performs side effects beyond writing image files.
//! Everything else (UDP notifications, telemetry logs, printing) hangs off an
//! [`EventSink`].

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::path::PathBuf;

use bytes::Bytes;
use crossbeam_channel::Sender;
use serde::Serialize;
use wenet_packets::{ChunkHeader, DecodeError, Packet, PacketKind};

use crate::config::UdpConfig;
use crate::error::Result;

/// Something the receive side observed.
#[derive(Debug, Clone, PartialEq)]
pub enum RxEvent {
    /// A non-image packet, decoded or not.
    Telemetry {
        kind: PacketKind,
        packet: std::result::Result<Packet, DecodeError>,
        /// The packet as received.
        raw: Bytes,
    },

    /// A completed image was decoded to `path`.
    ImageReady {
        path: PathBuf,
        header: ChunkHeader,
        packets: usize,
    },

    /// A partial decode of the image in progress was written to `path`.
    ImagePreview {
        path: PathBuf,
        header: ChunkHeader,
        packets: usize,
    },

    /// A completed image could not be stored or decoded. Its packets are gone.
    ImageDecodeFailed {
        callsign: String,
        image_id: u8,
        reason: String,
    },
}

/// Consumer of [`RxEvent`]s.
///
/// Sinks must not fail the session; they log their own errors.
pub trait EventSink: Send {
    fn emit(&mut self, event: &RxEvent);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &RxEvent) {
        (**self).emit(event);
    }
}

impl EventSink for Vec<Box<dyn EventSink>> {
    fn emit(&mut self, event: &RxEvent) {
        for sink in self.iter_mut() {
            sink.emit(event);
        }
    }
}

impl EventSink for Vec<RxEvent> {
    fn emit(&mut self, event: &RxEvent) {
        self.push(event.clone());
    }
}

/// Forwards events to another thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<RxEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<RxEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &RxEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

#[derive(Serialize)]
struct TelemetryDatagram<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    packet: &'a [u8],
}

#[derive(Serialize)]
struct GuiDatagram<'a> {
    filename: String,
    text: String,
    metadata: &'a ChunkHeader,
}

/// Sends telemetry and image notifications over UDP.
///
/// Telemetry goes out as `{"type": "WENET", "packet": [...]}` to the
/// telemetry port, falling back to loopback when broadcast is refused.
/// Image notifications go to the GUI on the image port.
pub struct UdpNotifier {
    socket: UdpSocket,
    config: UdpConfig,
}

impl UdpNotifier {
    pub fn new(config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
        if config.telemetry_addr.is_broadcast() {
            socket.set_broadcast(true)?;
        }
        tracing::debug!(?config, "udp notifier ready");
        Ok(Self { socket, config })
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }

    fn send(&self, datagram: &[u8], addr: SocketAddrV4) -> std::io::Result<()> {
        self.socket.send_to(datagram, addr).map(|_| ())
    }

    /// Secondary payloads never go to the image port, even when headless.
    fn broadcast_telemetry(&self, kind: PacketKind, raw: &[u8]) {
        let datagram = match serde_json::to_vec(&TelemetryDatagram {
            kind: "WENET",
            packet: raw,
        }) {
            Ok(datagram) => datagram,
            Err(err) => {
                tracing::warn!(error = %err, "could not encode telemetry datagram");
                return;
            }
        };

        let target = SocketAddrV4::new(self.config.telemetry_addr, self.config.telemetry_port);
        if let Err(err) = self.send(&datagram, target) {
            tracing::debug!(%target, error = %err, "telemetry send failed, trying loopback");
            let loopback = SocketAddrV4::new(Ipv4Addr::LOCALHOST, self.config.telemetry_port);
            if let Err(err) = self.send(&datagram, loopback) {
                tracing::warn!(error = %err, "could not send telemetry");
            }
        }

        if self.config.headless && kind != PacketKind::SecondaryPayload {
            let gui = SocketAddrV4::new(self.config.gui_addr, self.config.image_port);
            if let Err(err) = self.send(&datagram, gui) {
                tracing::debug!(error = %err, "could not forward telemetry to image port");
            }
        }
    }

    fn notify_gui(&self, path: &std::path::Path, header: &ChunkHeader) {
        let message = GuiDatagram {
            filename: path.display().to_string(),
            text: header.to_string(),
            metadata: header,
        };
        let result = serde_json::to_vec(&message)
            .map_err(std::io::Error::from)
            .and_then(|datagram| {
                self.send(
                    &datagram,
                    SocketAddrV4::new(self.config.gui_addr, self.config.image_port),
                )
            });
        if let Err(err) = result {
            tracing::debug!(error = %err, "could not notify gui");
        }
    }
}

impl EventSink for UdpNotifier {
    fn emit(&mut self, event: &RxEvent) {
        match event {
            RxEvent::Telemetry { kind, raw, .. } if kind.is_telemetry() => {
                self.broadcast_telemetry(*kind, raw);
            }
            RxEvent::ImageReady { path, header, .. }
            | RxEvent::ImagePreview { path, header, .. } => self.notify_gui(path, header),
            RxEvent::Telemetry { .. } | RxEvent::ImageDecodeFailed { .. } => {}
        }
    }
}
