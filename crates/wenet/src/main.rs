mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wenet", version, about = "Wenet balloon imagery downlink")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tx_subcommand() {
        let cli = Cli::try_parse_from([
            "wenet",
            "tx",
            "/dev/ttyAMA0",
            "--callsign",
            "VK5QI",
            "--image",
            "a.ssdv",
            "--image",
            "b.ssdv",
            "--beacon",
            "hello",
        ])
        .expect("tx args should parse");

        let Command::Tx(args) = cli.command else {
            panic!("expected tx");
        };
        assert_eq!(args.callsign, "VK5QI");
        assert_eq!(args.images.len(), 2);
        assert_eq!(args.udp_port, 55674);
        assert_eq!(args.beacon_interval, "10s");
    }

    #[test]
    fn rs232_requires_bit_dump() {
        let err = Cli::try_parse_from(["wenet", "tx", "out.bin", "--rs232"])
            .expect_err("--rs232 alone should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_rx_defaults() {
        let cli = Cli::try_parse_from(["wenet", "rx", "--hex"]).expect("rx args should parse");
        let Command::Rx(args) = cli.command else {
            panic!("expected rx");
        };
        assert!(args.hex);
        assert!(args.input.is_none());
        assert_eq!(args.rx_images, std::path::PathBuf::from("./rx_images"));
        assert_eq!(args.image_port, 7890);
        assert_eq!(args.telemetry_port, 55672);
    }

    #[test]
    fn headless_conflicts_with_no_udp() {
        let err = Cli::try_parse_from(["wenet", "rx", "--headless", "--no-udp"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["wenet", "decode", "packets.bin", "--format", "json"])
            .expect("decode args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
