//! Per-kind JSON-lines telemetry logs.
//!
//! One file per telemetry kind, named `<prefix>_<kind>.log` inside the log
//! directory. The prefix is the session start time (`YYYYmmdd-HHMMZ`).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use wenet_packets::{Packet, PacketKind};

use crate::error::Result;
use crate::events::{EventSink, RxEvent};

pub struct TelemetryLog {
    dir: PathBuf,
    prefix: String,
    files: HashMap<PacketKind, File>,
}

impl TelemetryLog {
    /// Log into `dir`, prefixed with the current UTC time.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_prefix(dir, Utc::now().format("%Y%m%d-%H%MZ").to_string())
    }

    pub fn with_prefix(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            files: HashMap::new(),
        })
    }

    /// Path of the log for `kind`.
    pub fn path(&self, kind: PacketKind) -> PathBuf {
        self.dir.join(format!("{}_{}.log", self.prefix, kind.name()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one record.
    pub fn append(&mut self, packet: &Packet) -> Result<()> {
        let kind = packet.kind();
        let mut line = serde_json::to_vec(packet)?;
        line.push(b'\n');

        let path = self.path(kind);
        let file = match self.files.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!(path = %path.display(), "opening telemetry log");
                entry.insert(OpenOptions::new().create(true).append(true).open(path)?)
            }
        };
        file.write_all(&line)?;
        Ok(())
    }
}

impl EventSink for TelemetryLog {
    fn emit(&mut self, event: &RxEvent) {
        let RxEvent::Telemetry {
            kind,
            packet: Ok(packet),
            ..
        } = event
        else {
            return;
        };
        if !kind.is_telemetry() {
            return;
        }
        if let Err(err) = self.append(packet) {
            tracing::warn!(%kind, error = %err, "could not write telemetry log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wenet_packets::{decode_packet, SecondaryPayload, TextMessage};

    fn event(raw: Bytes) -> RxEvent {
        RxEvent::Telemetry {
            kind: PacketKind::of(&raw).unwrap(),
            packet: decode_packet(&raw),
            raw,
        }
    }

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = TelemetryLog::with_prefix(dir.path(), "20240101-0000Z").unwrap();

        log.emit(&event(TextMessage::new(1, "first").encode()));
        log.emit(&event(TextMessage::new(2, "second").encode()));

        let path = log.path(PacketKind::TextMessage);
        assert_eq!(path, dir.path().join("20240101-0000Z_text.log"));
        let records = lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "text");
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[1]["text"], "second");
    }

    #[test]
    fn secondary_payload_is_hex() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = TelemetryLog::with_prefix(dir.path(), "p").unwrap();

        log.emit(&event(
            SecondaryPayload::new(4, vec![0xDE, 0xAD, 0xBE, 0xEF]).encode(),
        ));

        let records = lines(&log.path(PacketKind::SecondaryPayload));
        assert_eq!(records[0]["payload"], "deadbeef");
        assert_eq!(records[0]["id"], 4);
    }

    #[test]
    fn skips_errors_and_non_telemetry() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = TelemetryLog::with_prefix(dir.path(), "p").unwrap();

        log.emit(&event(Bytes::from_static(&[0x01, 0x02])));
        log.emit(&event(Bytes::from_static(&[0x20])));
        log.emit(&RxEvent::ImageDecodeFailed {
            callsign: "VK5QI".into(),
            image_id: 1,
            reason: "boom".into(),
        });

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
