use std::io::Read;

use wenet_frame::{
    decode_frame, FrameConfig, FrameError, PacketReader, FEC_FRAME_SIZE, FRAME_SIZE,
};
use wenet_packets::{decode_packet, PacketKind};

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{
    decode_error, frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_packets, OutputFormat, PacketRecord};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(args.input.as_deref())?;
    let (packets, bad_input) = if args.framed {
        read_framed(input, args.fec)?
    } else {
        read_packets(input, args.hex)?
    };

    let records: Vec<PacketRecord> = packets
        .into_iter()
        .enumerate()
        .filter(|(_, raw)| !(args.skip_idle && PacketKind::of(raw) == Some(PacketKind::Idle)))
        .map(|(index, raw)| PacketRecord {
            index,
            packet: decode_packet(&raw),
            raw,
        })
        .collect();

    let failures = decode_failures(&records);
    print_packets(&records, format);

    for failure in &failures {
        tracing::warn!(code = failure.code, "{failure}");
    }
    if bad_input > 0 || !failures.is_empty() {
        tracing::warn!(
            bad_input,
            undecodable = failures.len(),
            "some input could not be decoded"
        );
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn decode_failures(records: &[PacketRecord]) -> Vec<CliError> {
    records
        .iter()
        .filter_map(|record| {
            let err = record.packet.as_ref().err()?;
            Some(decode_error(&format!("packet {}", record.index), err.clone()))
        })
        .collect()
}

/// Bare packets, raw or hex. Returns the packets and the count of bad lines.
fn read_packets(input: impl Read, hex: bool) -> CliResult<(Vec<Vec<u8>>, usize)> {
    let mut reader = PacketReader::with_config(input, FrameConfig { hex_input: hex });
    let mut packets = Vec::new();
    let mut bad = 0;
    loop {
        match reader.read_packet() {
            Ok(packet) => packets.push(packet.to_vec()),
            Err(FrameError::ConnectionClosed) => return Ok((packets, bad)),
            Err(err @ FrameError::InvalidHex { .. }) => {
                tracing::warn!(error = %err, "skipping input line");
                bad += 1;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }
}

/// A transmit stream: fixed-size frames back to back. Frames that fail to
/// deframe are counted and skipped.
fn read_framed(mut input: impl Read, fec: bool) -> CliResult<(Vec<Vec<u8>>, usize)> {
    let mut stream = Vec::new();
    input
        .read_to_end(&mut stream)
        .map_err(|err| io_error("read failed", err))?;

    let frame_size = if fec { FEC_FRAME_SIZE } else { FRAME_SIZE };
    let mut packets = Vec::new();
    let mut bad = 0;
    for (index, frame) in stream.chunks(frame_size).enumerate() {
        match decode_frame(frame) {
            Ok(deframed) => packets.push(deframed.payload.to_vec()),
            Err(err) => {
                tracing::warn!(frame = index, error = %err, "skipping frame");
                bad += 1;
            }
        }
    }
    Ok((packets, bad))
}
