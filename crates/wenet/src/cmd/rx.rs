use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use wenet_frame::{FrameConfig, PacketReader};
use wenet_rx::{
    Dispatcher, EventSink, ReceiveSession, RxConfig, RxEvent, SessionEnd, SsdvCommand,
    TelemetryLog, UdpConfig, UdpNotifier,
};

use crate::cmd::{install_ctrlc_handler, open_input, RxArgs};
use crate::exit::{rx_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_event, print_summary, OutputFormat};

/// Prints events on stdout.
struct ConsoleSink {
    format: OutputFormat,
}

impl EventSink for ConsoleSink {
    fn emit(&mut self, event: &RxEvent) {
        print_event(event, self.format);
    }
}

fn config(args: &RxArgs) -> RxConfig {
    let udp = (!args.no_udp).then(|| UdpConfig {
        image_port: args.image_port,
        telemetry_port: args.telemetry_port,
        headless: args.headless,
        ..UdpConfig::default()
    });
    RxConfig::default()
        .with_rx_images(&args.rx_images)
        .with_partial_update(args.partial_update)
        .with_udp(udp)
        .with_telemetry_log(!args.no_log)
}

pub fn run(args: RxArgs, format: OutputFormat) -> CliResult<i32> {
    let config = config(&args);

    let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(ConsoleSink { format })];
    if config.telemetry_log {
        let log = TelemetryLog::new(&config.rx_images)
            .map_err(|err| rx_error("failed opening telemetry log", err))?;
        sinks.push(Box::new(log));
    }
    if let Some(udp) = config.udp {
        let notifier =
            UdpNotifier::new(udp).map_err(|err| rx_error("failed opening udp socket", err))?;
        sinks.push(Box::new(notifier));
    }

    let dispatcher = Dispatcher::new(&config, SsdvCommand::new(&args.ssdv), sinks)
        .map_err(|err| rx_error("failed preparing image directory", err))?;

    let input = open_input(args.input.as_deref())?;
    let reader = PacketReader::with_config(input, FrameConfig { hex_input: args.hex });

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop))?;

    tracing::info!(
        rx_images = %config.rx_images.display(),
        partial_update = config.partial_update,
        "receiver started"
    );
    let summary = ReceiveSession::new(reader, dispatcher)
        .run(&stop)
        .map_err(|err| rx_error("receive failed", err))?;
    print_summary(&summary, format);

    // A live demodulator pipe never closes on its own; losing it is an error.
    let from_stdin = args.input.as_deref().is_none_or(|path| path.as_os_str() == "-");
    if summary.end == SessionEnd::Eof && from_stdin {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RxArgs {
        RxArgs {
            input: None,
            hex: false,
            partial_update: 0,
            rx_images: PathBuf::from("./rx_images"),
            ssdv: PathBuf::from("ssdv"),
            image_port: 7890,
            telemetry_port: 55672,
            headless: false,
            no_udp: false,
            no_log: false,
        }
    }

    #[test]
    fn maps_args_into_config() {
        let config = config(&RxArgs {
            partial_update: 10,
            image_port: 9000,
            headless: true,
            ..args()
        });
        assert_eq!(config.partial_update, 10);
        let udp = config.udp.unwrap();
        assert_eq!(udp.image_port, 9000);
        assert!(udp.headless);
        assert!(udp.telemetry_addr.is_broadcast());
    }

    #[test]
    fn no_udp_disables_notifier() {
        let config = config(&RxArgs {
            no_udp: true,
            no_log: true,
            ..args()
        });
        assert!(config.udp.is_none());
        assert!(!config.telemetry_log);
    }
}
