//! The installation driver: reads tracker lines on stdin (or simulates
//! them), runs the grid -> raster -> serial pipeline at the configured tick
//! rate, and streams tempo commands to the metronome wall.
//!
//! Example:
//! RUST_LOG=info tracker | metrogrid --config wall.ron live --choose
//! RUST_LOG=debug metrogrid sim -n 3 -t 200

use clap::Parser;
use log::{debug, info, warn};
use metrogrid::{
    args::{CommandTask, GridArgs, LiveCommand, SimCommand},
    blob_accumulator::BlobAccumulator,
    config::InstallationConfig,
    dummy_tracker::DummyTracker,
    gui::{device_selector, run_until_stop},
    kernel::Kernel,
    pipeline::MetronomePipeline,
    serial_link::SerialLink,
    tracker::BlobSource,
    tracker_decoder::TrackerMessage,
    tracker_feed::TrackerFeed,
    transport::{LogTransport, Transport},
};
use spin_sleep::SpinSleeper;
use std::{
    io::BufRead,
    str::FromStr,
    sync::{Arc, Mutex},
    thread::spawn,
    time::Duration,
};

fn main() {
    env_logger::init();
    let args = GridArgs::parse();

    let mut config = match InstallationConfig::load(&args.config) {
        Ok(config) => config,
        Err(error) => {
            warn!("could not load settings ({}), using defaults", error);
            InstallationConfig::default()
        }
    };
    if let Some(update_rate) = args.update_rate {
        config.update_rate = update_rate;
    }

    let kernel = match Kernel::load(&config.kernel_path) {
        Ok(kernel) => kernel,
        Err(error) => {
            warn!("kernel asset unavailable ({}), using built-in stamp", error);
            Kernel::default_stamp()
        }
    };

    match &args.command {
        CommandTask::Live(cmd) => run_live(&config, kernel, cmd),
        CommandTask::Sim(cmd) => run_sim(&config, kernel, cmd),
    }
}

fn run_live(config: &InstallationConfig, kernel: Kernel, cmd: &LiveCommand) {
    let filter = cmd.port_filter.as_deref().unwrap_or(&config.port_filter);
    let transport = open_transport(filter, config.baud, cmd.choose);

    let feed = TrackerFeed::new();
    let reader_feed = feed.clone();
    let _reader = spawn(move || read_tracker_lines(reader_feed));

    let accumulator = BlobAccumulator::new(
        Arc::new(Mutex::new(feed)),
        config.blob_staleness_ticks,
    );
    let pipeline = MetronomePipeline::new(config, kernel, transport);
    drive(pipeline, accumulator, config.update_rate, 0);
}

fn run_sim(config: &InstallationConfig, kernel: Kernel, cmd: &SimCommand) {
    let tracker = DummyTracker::builder().blob_count(cmd.blob_count).build();
    let tracker = Arc::new(Mutex::new(tracker));
    let accumulator = BlobAccumulator::new(Arc::clone(&tracker), config.blob_staleness_ticks);

    if cmd.hardware {
        let transport = open_transport(&config.port_filter, config.baud, false);
        let pipeline = MetronomePipeline::new(config, kernel, transport);
        drive(pipeline, accumulator, config.update_rate, cmd.ticks);
    } else {
        let pipeline = MetronomePipeline::new(config, kernel, Some(LogTransport));
        drive(pipeline, accumulator, config.update_rate, cmd.ticks);
    }

    tracker.lock().unwrap().stop();
}

/// Opens the first device matching `filter`, optionally falling back to an
/// interactive picker. `None` means the wall animates without hardware.
fn open_transport(filter: &str, baud: u32, choose: bool) -> Option<SerialLink> {
    match SerialLink::open_matching(filter, baud) {
        Ok(Some(link)) => return Some(link),
        Ok(None) => warn!("no serial device name contains {:?}", filter),
        Err(error) => {
            warn!("serial discovery failed: {}", error);
            return None;
        }
    }

    if !choose {
        info!("running without hardware delivery");
        return None;
    }
    let ports = SerialLink::list_devices().unwrap_or_default();
    match device_selector(ports) {
        Ok(Some(path)) => match SerialLink::open(&path, baud) {
            Ok(link) => Some(link),
            Err(error) => {
                warn!("could not open {}: {}", path.display(), error);
                None
            }
        },
        Ok(None) => None,
        Err(error) => {
            warn!("device selector failed: {}", error);
            None
        }
    }
}

/// Reads tracker lines from stdin until the stream closes, feeding decoded
/// centroids to the pipeline's buffer. Garbage lines are common right after
/// the tracker starts; they are logged and skipped.
fn read_tracker_lines(mut feed: TrackerFeed) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.is_empty() {
            continue;
        }
        match TrackerMessage::from_str(&line) {
            Ok(TrackerMessage::Blob(msg)) => {
                debug!("tracker reported {:?}", msg);
                feed.add_message(msg);
            }
            Ok(TrackerMessage::Flush) => {
                info!("tracker flushed, dropping buffered positions");
                feed.clear();
            }
            Err(error) => {
                warn!("unparsable tracker line: {}", error);
            }
        }
    }
    info!("tracker stream closed");
}

/// Ticks the pipeline at the configured rate. With `ticks` > 0 the loop is
/// finite and headless; otherwise it runs under the operator screen until a
/// key is pressed. Either way the wall is stopped on the way out.
fn drive<T, S>(
    mut pipeline: MetronomePipeline<T>,
    mut accumulator: BlobAccumulator<S>,
    update_rate: f32,
    ticks: u64,
) where
    T: Transport + Send + Sync + 'static,
    S: BlobSource + Send + Sync + 'static,
{
    let period = Duration::from_secs_f32(1.0 / update_rate);

    if ticks > 0 {
        let sleeper = SpinSleeper::default();
        for _ in 0..ticks {
            let blobs = accumulator.get_status();
            pipeline.tick(&blobs);
            sleeper.sleep(period);
        }
        info!("last command: {}", pipeline.status());
        pipeline.shutdown();
        return;
    }

    let status = Arc::new(Mutex::new(String::new()));
    let shared_status = Arc::clone(&status);
    let result = run_until_stop(
        "Driving metronome wall",
        status,
        (pipeline, accumulator),
        move |(mut pipeline, mut accumulator)| {
            let blobs = accumulator.get_status();
            pipeline.tick(&blobs);
            *shared_status.lock().unwrap() = pipeline.status().to_owned();
            SpinSleeper::default().sleep(period);
            (pipeline, accumulator)
        },
    );
    match result {
        Ok((mut pipeline, _accumulator)) => pipeline.shutdown(),
        Err(error) => warn!("operator screen failed: {}", error),
    }
}
