//! Transmit and receive in one process: frames leaving the scheduler are
//! deframed and replayed through a receive session.
//!
//! Run with:
//!   cargo run --example loopback -- path/to/image.ssdv
//!
//! Decoding the image needs the `ssdv` program on PATH; without it the
//! example reports an image decode failure and still prints the telemetry.

use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use wenet::frame::{decode_frame, PacketReader};
use wenet::rx::{Dispatcher, ReceiveSession, RxConfig, RxEvent, SsdvCommand};
use wenet::tx::{Radio, Scheduler, SchedulerConfig};

/// Keeps the payload of every non-idle frame.
#[derive(Default)]
struct Loopback {
    packets: Vec<u8>,
}

impl Radio for Loopback {
    fn transmit(&mut self, frame: &[u8]) -> wenet::tx::Result<()> {
        let payload = decode_frame(frame)?.payload;
        if payload[0] != wenet::packets::kind::IDLE {
            self.packets.extend_from_slice(&payload);
        }
        // Roughly one frame's airtime at 115.2 kbit/s.
        thread::sleep(Duration::from_millis(20));
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handle = Scheduler::new(Loopback::default(), "N0CALL", SchedulerConfig::default()).spawn()?;
    let queues = handle.queues();

    queues.transmit_text_message("loopback test", 1)?;
    for path in std::env::args().skip(1) {
        let packets = queues.queue_image_file(&path)?;
        eprintln!("Queued {packets} packets from {path}");
    }
    queues.wait_image_queue_empty();
    thread::sleep(Duration::from_millis(200));

    handle.stop();
    let radio = handle.join()?;
    eprintln!("Transmitted {} bytes of packets", radio.packets.len());

    let rx_images = std::env::temp_dir().join(format!("wenet-loopback-{}", std::process::id()));
    let config = RxConfig::default()
        .with_rx_images(&rx_images)
        .with_udp(None);
    let dispatcher = Dispatcher::new(&config, SsdvCommand::default(), Vec::<RxEvent>::new())?;
    let mut session = ReceiveSession::new(PacketReader::new(Cursor::new(radio.packets)), dispatcher);
    let summary = session.run(&AtomicBool::new(false))?;

    for event in session.dispatcher().sink() {
        match event {
            RxEvent::Telemetry { packet: Ok(packet), .. } => println!("{packet}"),
            RxEvent::ImageReady { path, .. } => println!("Image written to {}", path.display()),
            RxEvent::ImageDecodeFailed { reason, .. } => println!("Image failed: {reason}"),
            other => println!("{other:?}"),
        }
    }
    eprintln!("{summary:?}");
    Ok(())
}
