use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod frame;
pub mod rx;
pub mod tx;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transmit queued images and telemetry to a radio device or file.
    Tx(TxArgs),
    /// Receive decoded packets, reassemble images and forward telemetry.
    Rx(RxArgs),
    /// Decode packets and print them.
    Decode(DecodeArgs),
    /// Frame a single payload for transmission.
    Frame(FrameArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Tx(args) => tx::run(args, format),
        Command::Rx(args) => rx::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Frame(args) => frame::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// Serial device or file to write frames to; `-` for stdout.
    pub output: PathBuf,
    /// Callsign used in idle and beacon messages.
    #[arg(long, default_value = "N0CALL")]
    pub callsign: String,
    /// Parity generator table; FEC is enabled only when given.
    #[arg(long, value_name = "FILE")]
    pub fec_table: Option<PathBuf>,
    /// Write one byte per bit instead of packed frames.
    #[arg(long)]
    pub bit_dump: bool,
    /// Wrap each bit-dumped byte in RS-232 start and stop bits.
    #[arg(long, requires = "bit_dump")]
    pub rs232: bool,
    /// SSDV packet files to transmit, in order.
    #[arg(long = "image", value_name = "FILE")]
    pub images: Vec<PathBuf>,
    /// Text beacon sent periodically.
    #[arg(long)]
    pub beacon: Option<String>,
    /// Interval between beacons (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub beacon_interval: String,
    /// Send host health as GPS telemetry (no fix) at this interval.
    #[arg(long, value_name = "INTERVAL")]
    pub housekeeping: Option<String>,
    /// Minimum time per frame; by default the device write paces the link.
    #[arg(long)]
    pub interval: Option<String>,
    /// UDP port for telemetry injection commands.
    #[arg(long, default_value_t = wenet_tx::DEFAULT_COMMAND_PORT)]
    pub udp_port: u16,
    /// Do not listen for UDP commands.
    #[arg(long)]
    pub no_udp: bool,
    /// Stop after this many frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Stop once every queued image has been sent.
    #[arg(long)]
    pub drain: bool,
}

#[derive(Args, Debug)]
pub struct RxArgs {
    /// Packet stream to read; stdin when omitted.
    pub input: Option<PathBuf>,
    /// Input is one hex-encoded packet per line.
    #[arg(long)]
    pub hex: bool,
    /// Decode a preview every N image packets (0 disables).
    #[arg(long, default_value_t = 0)]
    pub partial_update: usize,
    /// Directory for received images and telemetry logs.
    #[arg(long, value_name = "DIR", default_value = wenet_rx::DEFAULT_RX_IMAGES)]
    pub rx_images: PathBuf,
    /// SSDV decoder program.
    #[arg(long, value_name = "PROGRAM", default_value = wenet_rx::SsdvCommand::DEFAULT_PROGRAM)]
    pub ssdv: PathBuf,
    /// GUI notification port.
    #[arg(long, default_value_t = wenet_rx::DEFAULT_IMAGE_PORT)]
    pub image_port: u16,
    /// Telemetry broadcast port.
    #[arg(long, default_value_t = wenet_rx::DEFAULT_TELEMETRY_PORT)]
    pub telemetry_port: u16,
    /// Also forward telemetry to the image port.
    #[arg(long, conflicts_with = "no_udp")]
    pub headless: bool,
    /// Disable all UDP output.
    #[arg(long)]
    pub no_udp: bool,
    /// Do not write per-kind telemetry logs.
    #[arg(long)]
    pub no_log: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packet stream to read; stdin when omitted.
    pub input: Option<PathBuf>,
    /// Input is one hex-encoded packet per line.
    #[arg(long, conflicts_with = "framed")]
    pub hex: bool,
    /// Input is a framed transmit stream rather than bare packets.
    #[arg(long)]
    pub framed: bool,
    /// Framed input carries parity bytes.
    #[arg(long, requires = "framed")]
    pub fec: bool,
    /// Hide idle packets.
    #[arg(long)]
    pub skip_idle: bool,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Payload file; stdin when omitted.
    pub input: Option<PathBuf>,
    /// Parity generator table; FEC is enabled only when given.
    #[arg(long, value_name = "FILE")]
    pub fec_table: Option<PathBuf>,
    /// Frame a text message instead of a raw payload.
    #[arg(long, conflicts_with = "input")]
    pub text: Option<String>,
    /// Deframe the result again and check it before writing.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open `path`, or stdin when it is absent or `-`.
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read + Send>> {
    match path {
        None => Ok(Box::new(io::stdin())),
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdin())),
        Some(path) => File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read + Send>)
            .map_err(|err| io_error(&format!("failed opening {}", path.display()), err)),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn install_ctrlc_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn missing_input_file_fails() {
        let err = open_input(Some(Path::new("/definitely/not/here.bin")))
            .err()
            .unwrap();
        assert_eq!(err.code, crate::exit::FAILURE);
    }
}
