use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use wenet_frame::RepeatAccumulateEncoder;
use wenet_packets::{GpsTime, Navigation};
use wenet_tx::host::UNKNOWN_TEMPERATURE;
use wenet_tx::{
    BitDumpRadio, CameraState, CommandListener, HostStats, Radio, Scheduler, SchedulerConfig,
    TransmitQueues, WriterRadio,
};

use crate::cmd::{install_ctrlc_handler, parse_duration, TxArgs};
use crate::exit::{frame_error, io_error, tx_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_summary, OutputFormat};

const POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Serialize)]
struct TxSummary {
    frames: u64,
    images: usize,
    image_packets: usize,
    fec: bool,
}

pub fn run(args: TxArgs, format: OutputFormat) -> CliResult<i32> {
    let beacon_interval = parse_duration(&args.beacon_interval)?;
    let housekeeping_interval = args
        .housekeeping
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let mut config = SchedulerConfig::default();
    if let Some(interval) = &args.interval {
        config = config.with_interval(parse_duration(interval)?);
    }
    if let Some(path) = &args.fec_table {
        let encoder = RepeatAccumulateEncoder::load(path).map_err(|err| {
            frame_error(&format!("failed loading {}", path.display()), err)
        })?;
        config = config.with_fec(Arc::new(encoder));
    }
    let fec = config.fec.is_some();

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop))?;

    let sink = open_output(&args.output)?;
    let radio: Box<dyn Radio> = if args.bit_dump {
        Box::new(BitDumpRadio::new(sink, args.rs232))
    } else {
        Box::new(WriterRadio::new(sink))
    };
    let radio = CountingRadio {
        inner: radio,
        sent: 0,
        limit: args.count,
        limit_reached: Arc::clone(&stop),
    };

    let handle = Scheduler::new(radio, args.callsign.as_str(), config)
        .spawn()
        .map_err(|err| tx_error("failed starting scheduler", err))?;
    let queues = handle.queues();
    tracing::info!(
        output = %args.output.display(),
        callsign = %args.callsign,
        fec,
        "transmitter started"
    );

    let listener_stop = Arc::new(AtomicBool::new(false));
    let listener = if args.no_udp {
        None
    } else {
        let listener = CommandListener::bind(args.udp_port, queues.clone())
            .map_err(|err| tx_error("failed binding udp command port", err))?;
        Some(
            listener
                .spawn(Arc::clone(&listener_stop))
                .map_err(|err| tx_error("failed starting udp listener", err))?,
        )
    };

    let images = spawn_image_feeder(queues.clone(), args.images.clone())?;

    let mut next_beacon = Instant::now();
    let mut next_housekeeping = Instant::now();
    let mut scheduler_failed = false;
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        if handle.is_finished() {
            scheduler_failed = true;
            break;
        }
        if args.drain
            && images.is_finished()
            && queues.image_queue_empty()
            && queues.telemetry_queue_empty()
        {
            tracing::info!("all images sent");
            break;
        }
        if let Some(beacon) = &args.beacon {
            if Instant::now() >= next_beacon {
                queues
                    .transmit_text_message(beacon, 1)
                    .map_err(|err| tx_error("failed queueing beacon", err))?;
                next_beacon += beacon_interval;
            }
        }
        if let Some(interval) = housekeeping_interval {
            if Instant::now() >= next_housekeeping {
                queue_housekeeping(&queues)
                    .map_err(|err| tx_error("failed queueing housekeeping", err))?;
                next_housekeeping += interval;
            }
        }
        thread::sleep(POLL);
    }

    handle.stop();
    listener_stop.store(true, Ordering::SeqCst);
    let radio = handle
        .join()
        .map_err(|err| tx_error("transmitter failed", err))?;
    if let Some(listener) = listener {
        listener
            .join()
            .map_err(|_| CliError::new(INTERNAL, "udp listener panicked"))?
            .map_err(|err| tx_error("udp listener failed", err))?;
    }
    // A feeder still blocked on a full queue errors out once the scheduler is dropped.
    let (image_count, image_packets) = if images.is_finished() {
        images
            .join()
            .map_err(|_| CliError::new(INTERNAL, "image feeder panicked"))??
    } else {
        (0, 0)
    };
    if scheduler_failed {
        return Err(CliError::new(INTERNAL, "transmitter stopped unexpectedly"));
    }

    let summary = TxSummary {
        frames: radio.sent,
        images: image_count,
        image_packets,
        fec,
    };
    tracing::info!(?summary, "transmitter stopped");
    if args.output != Path::new("-") {
        print_summary(&summary, format);
    }
    Ok(SUCCESS)
}

fn open_output(path: &Path) -> CliResult<Box<dyn Write + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout()));
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map(|file| Box::new(file) as Box<dyn Write + Send>)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))
}

/// GPS telemetry carrying only host health. Position fields read as no fix.
fn queue_housekeeping(queues: &TransmitQueues) -> wenet_tx::Result<()> {
    let housekeeping =
        HostStats::collect(".").housekeeping(UNKNOWN_TEMPERATURE, CameraState::default());
    queues.transmit_gps_telemetry(GpsTime::default(), Navigation::default(), housekeeping)
}

type FeederHandle = thread::JoinHandle<CliResult<(usize, usize)>>;

fn spawn_image_feeder(queues: TransmitQueues, images: Vec<PathBuf>) -> CliResult<FeederHandle> {
    thread::Builder::new()
        .name("wenet-images".into())
        .spawn(move || {
            let mut packets = 0;
            for path in &images {
                let queued = queues.queue_image_file(path).map_err(|err| {
                    tx_error(&format!("failed queueing {}", path.display()), err)
                })?;
                tracing::info!(path = %path.display(), packets = queued, "image queued");
                packets += queued;
            }
            Ok((images.len(), packets))
        })
        .map_err(|err| io_error("failed starting image feeder", err))
}

/// Counts frames and, with a limit, raises `limit_reached` and drops any
/// frame past it.
struct CountingRadio<R> {
    inner: R,
    sent: u64,
    limit: Option<u64>,
    limit_reached: Arc<AtomicBool>,
}

impl<R: Radio> Radio for CountingRadio<R> {
    fn transmit(&mut self, frame: &[u8]) -> wenet_tx::Result<()> {
        if self.limit.is_some_and(|limit| self.sent >= limit) {
            return Ok(());
        }
        self.inner.transmit(frame)?;
        self.sent += 1;
        if self.limit == Some(self.sent) {
            self.limit_reached.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn shutdown(&mut self) -> wenet_tx::Result<()> {
        self.inner.shutdown()
    }
}
