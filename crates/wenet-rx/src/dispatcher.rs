//! Routes received packets by type tag.
//!
//! Idle packets are dropped, image chunks feed the [`ImageReassembler`] and
//! everything else is decoded and handed to the event sink as telemetry.
//! Completed images are written to the image directory and decoded there.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use wenet_packets::{decode_packet, ImageChunk, PacketKind};

use crate::config::RxConfig;
use crate::decoder::ImageDecoder;
use crate::error::{ImageDecodeError, Result};
use crate::events::{EventSink, RxEvent};
use crate::reassembler::{CompletedImage, ImageReassembler, Preview};

/// Staging file for progress decodes.
pub const PREVIEW_BIN: &str = "rxtemp.bin";

/// Output of progress decodes.
pub const PREVIEW_JPG: &str = "rxtemp.jpg";

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub packets: u64,
    pub idle: u64,
    pub telemetry: u64,
    pub unknown: u64,
    pub decode_errors: u64,
    pub image_chunks: u64,
    pub malformed_chunks: u64,
    pub images: u64,
    pub image_failures: u64,
    pub previews: u64,
}

pub struct Dispatcher<D, S> {
    rx_images: PathBuf,
    reassembler: ImageReassembler,
    decoder: D,
    sink: S,
    stats: DispatchStats,
}

impl<D: ImageDecoder, S: EventSink> Dispatcher<D, S> {
    /// Create a dispatcher, making sure the image directory exists.
    pub fn new(config: &RxConfig, decoder: D, sink: S) -> Result<Self> {
        fs::create_dir_all(&config.rx_images)?;
        Ok(Self {
            rx_images: config.rx_images.clone(),
            reassembler: ImageReassembler::new(config.partial_update),
            decoder,
            sink,
            stats: DispatchStats::default(),
        })
    }

    /// Handle one 256-byte packet.
    pub fn handle(&mut self, packet: &[u8]) {
        self.stats.packets += 1;

        match PacketKind::of(packet) {
            None => {
                tracing::warn!("empty packet");
                self.stats.decode_errors += 1;
            }
            Some(PacketKind::Idle) => self.stats.idle += 1,
            Some(PacketKind::ImageChunk) => match ImageChunk::decode(packet) {
                Ok(chunk) => self.handle_chunk(&chunk),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping malformed image chunk");
                    self.stats.malformed_chunks += 1;
                }
            },
            Some(kind) => self.handle_telemetry(kind, packet),
        }
    }

    /// End of session: flush the image being received.
    pub fn finish(&mut self) {
        if let Some(completed) = self.reassembler.finish() {
            self.complete_image(completed);
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn reassembler(&self) -> &ImageReassembler {
        &self.reassembler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn handle_telemetry(&mut self, kind: PacketKind, packet: &[u8]) {
        let decoded = decode_packet(packet);
        match &decoded {
            Ok(decoded) if matches!(kind, PacketKind::Unknown(_)) => {
                tracing::debug!(%decoded, "unknown packet type");
                self.stats.unknown += 1;
            }
            Ok(decoded) => {
                tracing::info!("{decoded}");
                self.stats.telemetry += 1;
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "could not decode packet");
                self.stats.decode_errors += 1;
            }
        }

        self.sink.emit(&RxEvent::Telemetry {
            kind,
            packet: decoded,
            raw: Bytes::copy_from_slice(packet),
        });
    }

    fn handle_chunk(&mut self, chunk: &ImageChunk) {
        tracing::debug!(chunk = %chunk, "image chunk");
        self.stats.image_chunks += 1;

        let outcome = self.reassembler.push(chunk);
        if let Some(completed) = outcome.completed {
            self.complete_image(completed);
        }
        if let Some(preview) = outcome.preview {
            self.preview(preview);
        }
    }

    fn complete_image(&mut self, image: CompletedImage) {
        let stem = format!(
            "{}_{}_{}",
            image.started.format("%Y%m%d-%H%M%SZ"),
            image.key.callsign,
            image.key.image_id
        );
        let bin = self.rx_images.join(format!("{stem}.bin"));
        let jpg = self.rx_images.join(format!("{stem}.jpg"));

        match stage_and_decode(&self.decoder, &image.data, &bin, &jpg) {
            Ok(()) => {
                tracing::info!(
                    image = %image.key,
                    packets = image.packets,
                    path = %jpg.display(),
                    "image received"
                );
                self.stats.images += 1;
                self.sink.emit(&RxEvent::ImageReady {
                    path: jpg,
                    header: image.header,
                    packets: image.packets,
                });
            }
            Err(err) => {
                tracing::warn!(image = %image.key, error = %err, "image decode failed");
                self.stats.image_failures += 1;
                self.sink.emit(&RxEvent::ImageDecodeFailed {
                    callsign: image.key.callsign,
                    image_id: image.key.image_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn preview(&mut self, preview: Preview) {
        let bin = self.rx_images.join(PREVIEW_BIN);
        let jpg = self.rx_images.join(PREVIEW_JPG);

        match stage_and_decode(&self.decoder, &preview.data, &bin, &jpg) {
            Ok(()) => {
                tracing::debug!(image = %preview.key, packets = preview.packets, "preview decoded");
                self.stats.previews += 1;
                self.sink.emit(&RxEvent::ImagePreview {
                    path: jpg,
                    header: preview.header,
                    packets: preview.packets,
                });
            }
            Err(err) => {
                tracing::debug!(image = %preview.key, error = %err, "preview decode failed");
            }
        }
    }
}

fn stage_and_decode<D: ImageDecoder>(
    decoder: &D,
    data: &[u8],
    bin: &Path,
    jpg: &Path,
) -> std::result::Result<(), ImageDecodeError> {
    fs::write(bin, data).map_err(|source| ImageDecodeError::Stage {
        path: bin.to_path_buf(),
        source,
    })?;
    decoder.decode(bin, jpg)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use wenet_packets::{encode_callsign, Packet, TextMessage};

    /// Records calls; writes the input through as the "decoded" output.
    #[derive(Clone, Default)]
    pub(crate) struct FakeDecoder {
        pub(crate) calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
        pub(crate) fail: bool,
    }

    impl ImageDecoder for FakeDecoder {
        fn decode(&self, input: &Path, output: &Path) -> std::result::Result<(), ImageDecodeError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            if self.fail {
                return Err(ImageDecodeError::Stage {
                    path: input.to_path_buf(),
                    source: std::io::Error::other("fake decoder failure"),
                });
            }
            fs::copy(input, output).map_err(|source| ImageDecodeError::Stage {
                path: output.to_path_buf(),
                source,
            })?;
            Ok(())
        }
    }

    pub(crate) fn chunk(callsign: &str, image_id: u8, packet_id: u16) -> Vec<u8> {
        let mut packet = vec![0u8; ImageChunk::LENGTH];
        packet[0] = 0x55;
        packet[1] = 0x66;
        packet[2..6].copy_from_slice(&encode_callsign(callsign).to_be_bytes());
        packet[6] = image_id;
        packet[7..9].copy_from_slice(&packet_id.to_be_bytes());
        packet[9] = 40;
        packet[10] = 30;
        packet
    }

    fn dispatcher(
        dir: &Path,
        partial_update: usize,
        decoder: FakeDecoder,
    ) -> Dispatcher<FakeDecoder, Vec<RxEvent>> {
        let config = RxConfig::default()
            .with_rx_images(dir)
            .with_partial_update(partial_update);
        Dispatcher::new(&config, decoder, Vec::new()).unwrap()
    }

    #[test]
    fn idle_packets_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&[0x56; 256]);

        assert!(dispatcher.sink().is_empty());
        assert_eq!(dispatcher.stats().idle, 1);
        assert_eq!(dispatcher.stats().packets, 1);
    }

    #[test]
    fn telemetry_is_emitted_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        let raw = TextMessage::new(7, "hello").encode();
        dispatcher.handle(&raw);

        match &dispatcher.sink()[..] {
            [RxEvent::Telemetry {
                kind,
                packet: Ok(Packet::Text(message)),
                raw: emitted,
            }] => {
                assert_eq!(*kind, PacketKind::TextMessage);
                assert_eq!(message.text, "hello");
                assert_eq!(emitted, &raw);
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(dispatcher.stats().telemetry, 1);
    }

    #[test]
    fn undecodable_telemetry_is_still_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&[0x01, 0x02, 0x03]);

        assert!(matches!(
            &dispatcher.sink()[..],
            [RxEvent::Telemetry {
                kind: PacketKind::GpsTelemetry,
                packet: Err(_),
                ..
            }]
        ));
        assert_eq!(dispatcher.stats().decode_errors, 1);
    }

    #[test]
    fn unknown_tags_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&[0x42; 256]);

        assert_eq!(dispatcher.stats().unknown, 1);
        assert_eq!(dispatcher.sink().len(), 1);
    }

    #[test]
    fn malformed_chunk_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&chunk("VK5QI", 1, 0)[..100]);

        assert!(dispatcher.sink().is_empty());
        assert_eq!(dispatcher.stats().malformed_chunks, 1);
        assert!(dispatcher.reassembler().current_key().is_none());
    }

    #[test]
    fn image_boundary_writes_and_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FakeDecoder::default();
        let mut dispatcher = dispatcher(dir.path(), 0, decoder.clone());

        let first: Vec<_> = (0..3).map(|id| chunk("VK5QI", 1, id)).collect();
        for packet in &first {
            dispatcher.handle(packet);
        }
        assert!(dispatcher.sink().is_empty());

        dispatcher.handle(&chunk("VK5QI", 2, 0));

        let events = dispatcher.sink();
        let [RxEvent::ImageReady {
            path,
            header,
            packets,
        }] = &events[..]
        else {
            panic!("unexpected events {events:?}");
        };
        assert_eq!(*packets, 3);
        assert_eq!(header.image_id, 1);
        assert_eq!(header.packet_id, 2);

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("Z_VK5QI_1.jpg"), "{name}");
        assert_eq!(fs::read(path).unwrap(), first.concat());
        assert!(path.with_extension("bin").exists());

        let calls = decoder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, *path);
    }

    #[test]
    fn decoder_failure_emits_event_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FakeDecoder {
            fail: true,
            ..FakeDecoder::default()
        };
        let mut dispatcher = dispatcher(dir.path(), 0, decoder);

        dispatcher.handle(&chunk("VK5QI", 1, 0));
        dispatcher.handle(&chunk("VK5QI", 2, 0));

        match &dispatcher.sink()[..] {
            [RxEvent::ImageDecodeFailed {
                callsign,
                image_id,
                reason,
            }] => {
                assert_eq!(callsign, "VK5QI");
                assert_eq!(*image_id, 1);
                assert!(reason.contains("fake decoder failure"), "{reason}");
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(dispatcher.stats().image_failures, 1);
        assert_eq!(dispatcher.reassembler().current_packets(), 1);
        assert_eq!(dispatcher.reassembler().current_key().unwrap().image_id, 2);
    }

    #[test]
    fn previews_use_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FakeDecoder::default();
        let mut dispatcher = dispatcher(dir.path(), 2, decoder.clone());

        for id in 0..4 {
            dispatcher.handle(&chunk("VK5QI", 5, id));
        }

        let previews: Vec<_> = dispatcher
            .sink()
            .iter()
            .map(|event| match event {
                RxEvent::ImagePreview { path, packets, .. } => (path.clone(), *packets),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        let jpg = dir.path().join(PREVIEW_JPG);
        assert_eq!(previews, vec![(jpg.clone(), 2), (jpg.clone(), 4)]);
        assert_eq!(fs::read(&jpg).unwrap().len(), 4 * ImageChunk::LENGTH);

        let calls = decoder.calls.lock().unwrap();
        assert!(calls
            .iter()
            .all(|(input, _)| *input == dir.path().join(PREVIEW_BIN)));
    }

    #[test]
    fn failed_preview_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FakeDecoder {
            fail: true,
            ..FakeDecoder::default()
        };
        let mut dispatcher = dispatcher(dir.path(), 1, decoder);

        dispatcher.handle(&chunk("VK5QI", 5, 0));
        dispatcher.handle(&chunk("VK5QI", 5, 1));

        assert!(dispatcher.sink().is_empty());
        assert_eq!(dispatcher.stats().previews, 0);
    }

    #[test]
    fn finish_flushes_last_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&chunk("N0CALL", 9, 0));
        dispatcher.finish();
        dispatcher.finish();

        assert!(matches!(
            &dispatcher.sink()[..],
            [RxEvent::ImageReady { packets: 1, .. }]
        ));
        assert_eq!(dispatcher.stats().images, 1);
    }

    #[test]
    fn telemetry_between_chunks_does_not_split_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher(dir.path(), 0, FakeDecoder::default());

        dispatcher.handle(&chunk("VK5QI", 1, 0));
        dispatcher.handle(&TextMessage::new(1, "interleaved").encode());
        dispatcher.handle(&[0x56; 256]);
        dispatcher.handle(&chunk("VK5QI", 1, 1));

        assert_eq!(dispatcher.reassembler().current_packets(), 2);
        assert_eq!(dispatcher.sink().len(), 1);
    }
}
