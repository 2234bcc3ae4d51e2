use std::io::Read;
use std::sync::Arc;

use wenet_frame::{decode_frame, normalize_payload, Framer, RepeatAccumulateEncoder};
use wenet_packets::TextMessage;

use crate::cmd::{open_input, FrameArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_raw;

pub fn run(args: FrameArgs) -> CliResult<i32> {
    let framer = match &args.fec_table {
        Some(path) => {
            let encoder = RepeatAccumulateEncoder::load(path).map_err(|err| {
                frame_error(&format!("failed loading {}", path.display()), err)
            })?;
            Framer::with_parity(Arc::new(encoder))
        }
        None => Framer::new(),
    };

    let payload = match &args.text {
        Some(text) => TextMessage::new(0, text.as_str()).encode().to_vec(),
        None => {
            let mut payload = Vec::new();
            open_input(args.input.as_deref())?
                .read_to_end(&mut payload)
                .map_err(|err| io_error("failed reading payload", err))?;
            payload
        }
    };
    if payload.len() > wenet_frame::PAYLOAD_SIZE {
        tracing::warn!(
            len = payload.len(),
            "payload longer than one packet, truncating"
        );
    }

    let frame = framer.frame(&payload);
    if args.verify {
        verify(&frame, &payload)?;
    }
    print_raw(&frame);
    Ok(SUCCESS)
}

fn verify(frame: &[u8], payload: &[u8]) -> CliResult<()> {
    let deframed = decode_frame(frame).map_err(|err| frame_error("verify failed", err))?;
    if deframed.payload.as_ref() != normalize_payload(payload).as_slice() {
        return Err(CliError::new(DATA_INVALID, "verify failed: payload mismatch"));
    }
    tracing::info!(
        checksum = %format!("0x{:04X}", deframed.checksum),
        parity = deframed.parity.is_some(),
        "frame verified"
    );
    Ok(())
}
