mod gui;

use std::sync::{Arc, Mutex};

use gui::{engage_gui, RasterView};
use metrogrid::blob_accumulator::BlobAccumulator;
use metrogrid::config::InstallationConfig;
use metrogrid::dummy_tracker::DummyTracker;
use metrogrid::kernel::Kernel;
use metrogrid::pipeline::MetronomePipeline;
use metrogrid::transport::LogTransport;

fn main() {
    env_logger::init();

    let config = InstallationConfig::default();
    let tracker = DummyTracker::builder().blob_count(3).speed(0.02).build();
    let tracker_mtx = Arc::new(Mutex::new(tracker));
    let tracker = tracker_mtx.clone();

    let mut accumulator =
        BlobAccumulator::new(tracker_mtx.clone(), config.blob_staleness_ticks);
    let mut pipeline =
        MetronomePipeline::new(&config, Kernel::default_stamp(), Some(LogTransport));

    let width = config.grid_size;
    let _ = engage_gui(Box::new(move || {
        let blobs = accumulator.get_status();
        pipeline.tick(&blobs);
        RasterView {
            width,
            raw: pipeline.buffer().raw_values(),
            tempo: pipeline.buffer().tempo_values(),
            status: pipeline.status().to_owned(),
            blob_count: blobs.len(),
        }
    }));

    tracker.lock().unwrap().stop();
}
