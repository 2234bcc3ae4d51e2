use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{json, Value};
use wenet_packets::{DecodeError, Packet, PacketKind};
use wenet_rx::RxEvent;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded packet, as listed by `wenet decode`.
pub struct PacketRecord {
    pub index: usize,
    pub raw: Vec<u8>,
    pub packet: Result<Packet, DecodeError>,
}

impl PacketRecord {
    pub fn kind(&self) -> PacketKind {
        PacketKind::of(&self.raw).unwrap_or(PacketKind::Unknown(0))
    }

    fn to_json(&self) -> Value {
        let mut value = json!({
            "index": self.index,
            "kind": self.kind().name(),
            "size": self.raw.len(),
        });
        match &self.packet {
            Ok(packet) => value["packet"] = serde_json::to_value(packet).unwrap_or(Value::Null),
            Err(err) => value["error"] = Value::String(err.to_string()),
        }
        value
    }

    fn summary(&self) -> String {
        match &self.packet {
            Ok(packet) => packet.to_string(),
            Err(err) => format!("<undecodable: {err}>"),
        }
    }
}

pub fn print_packets(records: &[PacketRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!("{}", record.to_json());
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "SIZE", "PACKET"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    record.kind().to_string(),
                    record.raw.len().to_string(),
                    record.summary(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!("[{}] {}", record.index, record.summary());
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_raw(&record.raw);
            }
        }
    }
}

/// Print one receive event as it happens. Table output degrades to one
/// line per event, since rows cannot be appended to a printed table.
pub fn print_event(event: &RxEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", event_json(event)),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", event_line(event)),
        OutputFormat::Raw => {
            if let RxEvent::Telemetry { raw, .. } = event {
                print_raw(raw);
            }
        }
    }
}

fn event_json(event: &RxEvent) -> Value {
    match event {
        RxEvent::Telemetry { kind, packet, .. } => match packet {
            Ok(packet) => json!({
                "event": "telemetry",
                "kind": kind.name(),
                "packet": packet,
            }),
            Err(err) => json!({
                "event": "telemetry",
                "kind": kind.name(),
                "error": err.to_string(),
            }),
        },
        RxEvent::ImageReady {
            path,
            header,
            packets,
        } => json!({
            "event": "image_ready",
            "path": path.display().to_string(),
            "packets": packets,
            "header": header,
        }),
        RxEvent::ImagePreview {
            path,
            header,
            packets,
        } => json!({
            "event": "image_preview",
            "path": path.display().to_string(),
            "packets": packets,
            "header": header,
        }),
        RxEvent::ImageDecodeFailed {
            callsign,
            image_id,
            reason,
        } => json!({
            "event": "image_decode_failed",
            "callsign": callsign,
            "image_id": image_id,
            "reason": reason,
        }),
    }
}

fn event_line(event: &RxEvent) -> String {
    match event {
        RxEvent::Telemetry {
            packet: Ok(packet), ..
        } => packet.to_string(),
        RxEvent::Telemetry {
            kind,
            packet: Err(err),
            ..
        } => format!("{kind}: <undecodable: {err}>"),
        RxEvent::ImageReady {
            path,
            header,
            packets,
        } => format!(
            "Image {}#{} complete ({packets} packets): {}",
            header.callsign,
            header.image_id,
            path.display()
        ),
        RxEvent::ImagePreview { path, packets, .. } => {
            format!("Preview ({packets} packets): {}", path.display())
        }
        RxEvent::ImageDecodeFailed {
            callsign,
            image_id,
            reason,
        } => format!("Image {callsign}#{image_id} failed: {reason}"),
    }
}

/// Key/value summary printed when a long-running command ends.
pub fn print_summary<T: Serialize>(summary: &T, format: OutputFormat) {
    let value = serde_json::to_value(summary).unwrap_or(Value::Null);
    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            if let Value::Object(fields) = &value {
                for (name, field) in fields {
                    table.add_row(vec![name.clone(), plain(field)]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if let Value::Object(fields) = &value {
                let line: Vec<String> = fields
                    .iter()
                    .map(|(name, field)| format!("{name}={}", plain(field)))
                    .collect();
                println!("{}", line.join(" "));
            }
        }
        OutputFormat::Raw => {}
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
