//! Glues the mapper, the accumulation buffers and the serial scheduler into
//! the object one tick drives. All shared state is owned here and handed to
//! the parts explicitly; nothing in the crate reaches for a global.

use crate::accumulator::AccumulationBuffer;
use crate::config::InstallationConfig;
use crate::grid::GridMapper;
use crate::kernel::Kernel;
use crate::scheduler::SerialFrameScheduler;
use crate::tracker::Blob;
use crate::transport::Transport;
use crate::Point;

/// The per-tick grid -> raster -> serial pipeline.
pub struct MetronomePipeline<T: Transport> {
    mapper: GridMapper,
    buffer: AccumulationBuffer,
    scheduler: SerialFrameScheduler<T>,
}

impl<T: Transport> MetronomePipeline<T> {
    /// Assembles the pipeline from the installation settings. `transport` is
    /// `None` when no serial device was found; the pipeline then animates
    /// without hardware delivery.
    pub fn new(config: &InstallationConfig, kernel: Kernel, transport: Option<T>) -> Self {
        let mapper = GridMapper::new(config.grid_area, config.grid_size);
        let buffer = AccumulationBuffer::new(
            config.grid_size,
            config.grid_size,
            kernel,
            config.tempo_table.clone(),
            config.tempo_ceiling,
            config.idle_tempo,
            config.stamp_margin,
        );
        let scheduler =
            SerialFrameScheduler::new(transport, config.device_count, config.rotation_table());
        Self {
            mapper,
            buffer,
            scheduler,
        }
    }

    /// Runs one tick: map this frame's blobs to cells, rebuild the rasters,
    /// then let the scheduler emit its one command.
    pub fn tick(&mut self, blobs: &[Blob]) {
        let positions: Vec<Point> = blobs.iter().map(|blob| blob.pos).collect();
        let cells = self.mapper.map_to_cells(&positions);

        self.buffer.begin_frame(!blobs.is_empty());
        for cell in cells {
            self.buffer.stamp(cell);
        }

        let even = self.buffer.tempo_values_even();
        let odd = self.buffer.tempo_values_odd();
        self.scheduler.tick(&even, &odd, blobs.len());
    }

    /// Stops every device; called once on shutdown.
    pub fn shutdown(&mut self) {
        self.scheduler.stop_all();
    }

    /// The raster buffers, for the debug/readout surface.
    pub fn buffer(&self) -> &AccumulationBuffer {
        &self.buffer
    }

    /// The scheduler, for cycle state and the rolling status line.
    pub fn scheduler(&self) -> &SerialFrameScheduler<T> {
        &self.scheduler
    }

    /// The last command sent or the last transport error.
    pub fn status(&self) -> &str {
        self.scheduler.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TempoTable;
    use crate::tracker::Blob;
    use crate::transport::testing::MockTransport;
    use crate::Rectf;

    fn test_config() -> InstallationConfig {
        InstallationConfig {
            grid_size: 4,
            device_count: 7, // 4x4 raster -> 8 stereo pairs, 7 wired
            tempo_table: TempoTable::default(),
            ..InstallationConfig::default()
        }
    }

    fn blob(x: f64, y: f64) -> Blob {
        Blob {
            id: 0,
            pos: crate::Point { x, y },
        }
    }

    #[test]
    fn a_full_cycle_delivers_every_wired_device_once() {
        let config = test_config();
        let mut pipeline = MetronomePipeline::new(
            &config,
            Kernel::uniform(1, 1, 10),
            Some(MockTransport::default()),
        );

        for _ in 0..9 {
            pipeline.tick(&[blob(0.4, 0.6)]);
        }

        let sent = &pipeline.scheduler().transport().unwrap().sent;
        let fills: Vec<_> = sent.iter().filter(|l| l.contains("BPM")).collect();
        assert_eq!(fills.len(), 7);
        assert_eq!(sent.last().unwrap().as_str(), "Start\n");
    }

    #[test]
    fn a_stamped_cell_reaches_the_wire() {
        // Grid 4, margin 1: a blob near (0.9, 0.9) occupies cell (3, 3),
        // which mirrors to raster index (0, 0) = flat 0 = pair 0, even
        // channel. Kernel sample 10 -> bucket 0 -> 60 BPM.
        let config = test_config();
        let mut pipeline = MetronomePipeline::new(
            &config,
            Kernel::uniform(1, 1, 10),
            Some(MockTransport::default()),
        );

        for _ in 0..8 {
            pipeline.tick(&[blob(0.9, 0.9)]);
        }

        let sent = &pipeline.scheduler().transport().unwrap().sent;
        assert!(sent.contains(&"Set 1 BPM 60 0\n".to_owned()));
        assert!(sent
            .iter()
            .filter(|l| l.contains("BPM") && !l.ends_with("60 0\n"))
            .all(|l| l.ends_with("BPM 0 0\n")));
    }

    #[test]
    fn idle_frames_stream_the_idle_tempo() {
        let config = test_config();
        let mut pipeline = MetronomePipeline::new(
            &config,
            Kernel::uniform(1, 1, 10),
            Some(MockTransport::default()),
        );

        pipeline.tick(&[]);
        let sent = &pipeline.scheduler().transport().unwrap().sent;
        assert_eq!(sent[0], "Set 1 BPM 60 60\n");
    }

    #[test]
    fn shutdown_stops_the_wall() {
        let config = test_config();
        let mut pipeline = MetronomePipeline::new(
            &config,
            Kernel::uniform(1, 1, 10),
            Some(MockTransport::default()),
        );
        pipeline.shutdown();
        let sent = &pipeline.scheduler().transport().unwrap().sent;
        assert_eq!(sent.as_slice(), &["Set Stop_all\n".to_owned()]);
    }

    #[test]
    fn area_restriction_ignores_blobs_outside() {
        let config = InstallationConfig {
            grid_area: Rectf::new(0.25, 0.25, 0.75, 0.75),
            ..test_config()
        };
        let mut pipeline = MetronomePipeline::new(
            &config,
            Kernel::uniform(1, 1, 10),
            Some(MockTransport::default()),
        );

        // A blob outside the active area occupies no cell, but it still
        // counts as "blobs present": the rasters go to zero, not idle.
        for _ in 0..9 {
            pipeline.tick(&[blob(0.05, 0.05)]);
        }
        let sent = &pipeline.scheduler().transport().unwrap().sent;
        assert!(sent
            .iter()
            .filter(|l| l.contains("BPM"))
            .all(|l| l.ends_with("BPM 0 0\n")));
    }
}
