//! Accumulates occupied grid cells into two parallel rasters.
//!
//! Every occupied cell stamps the kernel into an intensity raster (raw debug
//! readout) and a tempo raster (the serial command source). The kernel is
//! stamped at a mirrored anchor, `(W - col - margin, H - row - margin)`,
//! because the camera hangs flipped relative to the wall; that flip is part
//! of the installed behavior and must not be "corrected" here.
//!
//! Tempo increments saturate: an increment that would reach the ceiling is
//! dropped outright rather than clamped, so a large kernel can under-report
//! near the ceiling and the final values depend on stamp order. Known and
//! accepted.

use crate::config::TempoTable;
use crate::kernel::Kernel;
use crate::GridCell;

/// Parallel intensity/tempo rasters with kernel stamping.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    width: usize,
    height: usize,
    kernel: Kernel,
    tempo_table: TempoTable,
    tempo_ceiling: f64,
    idle_tempo: u16,
    stamp_margin: usize,
    intensity: Vec<f64>,
    tempo: Vec<f64>,
}

impl AccumulationBuffer {
    /// Creates a `width` x `height` buffer pair.
    pub fn new(
        width: usize,
        height: usize,
        kernel: Kernel,
        tempo_table: TempoTable,
        tempo_ceiling: f64,
        idle_tempo: u16,
        stamp_margin: usize,
    ) -> Self {
        Self {
            width,
            height,
            kernel,
            tempo_table,
            tempo_ceiling,
            idle_tempo,
            stamp_margin,
            intensity: vec![0.0; width * height],
            tempo: vec![0.0; width * height],
        }
    }

    /// Raster width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Starts a frame. With blobs present both rasters are zeroed, ready for
    /// stamping; with none, the tempo raster is held at the idle constant and
    /// the intensity raster is left as it was. `has_blobs` gates idle mode,
    /// not the cell count: a frame with blobs but no occupied cells stays all
    /// zero.
    pub fn begin_frame(&mut self, has_blobs: bool) {
        if has_blobs {
            self.intensity.fill(0.0);
            self.tempo.fill(0.0);
        } else {
            self.tempo.fill(self.idle_tempo as f64);
        }
    }

    /// Stamps the kernel at `cell`'s mirrored anchor. Intensity accumulates
    /// unconditionally; tempo adds the table value for the sample's bucket
    /// (`v / 10 - 1`, bucket 0 of the raw scale meaning "no value") unless
    /// the cell would reach the ceiling. Kernel samples falling outside the
    /// raster are skipped.
    pub fn stamp(&mut self, cell: GridCell) {
        let anchor_x = self.width as isize - cell.col as isize - self.stamp_margin as isize;
        let anchor_y = self.height as isize - cell.row as isize - self.stamp_margin as isize;
        for (dx, dy, v) in self.kernel.iter() {
            let x = anchor_x + dx as isize;
            let y = anchor_y + dy as isize;
            if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
                continue;
            }
            let i = y as usize * self.width + x as usize;
            self.intensity[i] += v as f64;
            if let Some(bucket) = (v as usize / 10).checked_sub(1) {
                if let Some(bpm) = self.tempo_table.get(bucket) {
                    let bpm = bpm as f64;
                    if self.tempo[i] + bpm < self.tempo_ceiling {
                        self.tempo[i] += bpm;
                    }
                }
            }
        }
    }

    /// The intensity raster divided by 10, truncated, in row-major order.
    pub fn raw_values(&self) -> Vec<i64> {
        self.intensity.iter().map(|&v| v as i64 / 10).collect()
    }

    /// The tempo raster truncated to integers, in row-major order.
    pub fn tempo_values(&self) -> Vec<i64> {
        self.tempo.iter().map(|&v| v as i64).collect()
    }

    /// Tempo values at even flat indices; the left channel of each stereo
    /// device pair. The split is by flat index parity, not raster column.
    pub fn tempo_values_even(&self) -> Vec<i64> {
        self.tempo
            .iter()
            .step_by(2)
            .map(|&v| v as i64)
            .collect()
    }

    /// Tempo values at odd flat indices; the right channel of each pair.
    pub fn tempo_values_odd(&self) -> Vec<i64> {
        self.tempo
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&v| v as i64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: usize, height: usize, kernel: Kernel) -> AccumulationBuffer {
        AccumulationBuffer::new(
            width,
            height,
            kernel,
            TempoTable::default(),
            1640.0,
            60,
            1,
        )
    }

    #[test]
    fn begin_frame_without_blobs_holds_idle_tempo() {
        let mut buf = buffer(4, 4, Kernel::uniform(1, 1, 10));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(1, 1));
        let intensity_before = buf.raw_values();

        buf.begin_frame(false);
        assert!(buf.tempo_values().iter().all(|&v| v == 60));
        // Intensity raster is untouched in idle mode.
        assert_eq!(buf.raw_values(), intensity_before);
    }

    #[test]
    fn begin_frame_with_blobs_but_no_stamps_is_all_zero() {
        let mut buf = buffer(4, 4, Kernel::uniform(1, 1, 10));
        buf.begin_frame(false);
        buf.begin_frame(true);
        assert!(buf.tempo_values().iter().all(|&v| v == 0));
        assert!(buf.raw_values().iter().all(|&v| v == 0));
    }

    #[test]
    fn single_stamp_example_scenario() {
        // 2x2 grid, one blob in cell (1, 0), every kernel sample at
        // intensity 10: bucket 0, table entry 60. The mirrored anchor is
        // (2 - 1 - 1, 2 - 0 - 1) = (0, 1).
        let mut buf = buffer(2, 2, Kernel::uniform(1, 1, 10));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(1, 0));
        assert_eq!(buf.tempo_values(), vec![0, 0, 60, 0]);
        assert_eq!(buf.raw_values(), vec![0, 0, 1, 0]);
    }

    #[test]
    fn overlapping_stamps_accumulate() {
        let mut buf = buffer(4, 4, Kernel::uniform(2, 2, 10));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(1, 1));
        buf.stamp(GridCell::new(1, 1));
        let tempo = buf.tempo_values();
        assert_eq!(tempo.iter().filter(|&&v| v == 120).count(), 4);
    }

    #[test]
    fn low_intensity_samples_touch_only_the_raw_raster() {
        // Samples below 10 fall in reserved bucket 0 and carry no tempo.
        let mut buf = buffer(3, 3, Kernel::uniform(1, 1, 9));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(1, 1));
        assert!(buf.tempo_values().iter().all(|&v| v == 0));
        assert_eq!(buf.intensity.iter().sum::<f64>(), 9.0);
    }

    #[test]
    fn tempo_saturates_below_the_ceiling_while_intensity_grows() {
        // Sample 170 -> bucket 16 -> 220 BPM. 7 stamps reach 1540; the 8th
        // would hit 1760 >= 1640 and is dropped. Intensity keeps counting.
        let mut buf = buffer(3, 3, Kernel::uniform(1, 1, 170));
        buf.begin_frame(true);
        for _ in 0..20 {
            buf.stamp(GridCell::new(1, 1));
        }
        let i = 1 * 3 + 1; // mirrored anchor of (1, 1) on a 3x3 raster
        assert_eq!(buf.tempo[i], 1540.0);
        assert!(buf.tempo.iter().all(|&v| v < 1640.0));
        assert_eq!(buf.intensity[i], 20.0 * 170.0);
    }

    #[test]
    fn stamps_clip_at_the_raster_edge() {
        // Cell (0, 0) mirrors to anchor (W-1, H-1); a 3x3 kernel mostly
        // hangs off the raster and must not wrap or panic.
        let mut buf = buffer(4, 4, Kernel::uniform(3, 3, 10));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(0, 0));
        let touched = buf.tempo_values().iter().filter(|&&v| v > 0).count();
        assert_eq!(touched, 1);
    }

    #[test]
    fn even_and_odd_interleave_back_into_tempo_values() {
        let mut buf = buffer(4, 4, Kernel::uniform(2, 2, 50));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(2, 1));
        buf.stamp(GridCell::new(1, 2));

        let even = buf.tempo_values_even();
        let odd = buf.tempo_values_odd();
        let mut rebuilt = Vec::new();
        for (e, o) in even.iter().zip(odd.iter()) {
            rebuilt.push(*e);
            rebuilt.push(*o);
        }
        assert_eq!(rebuilt, buf.tempo_values());
        assert_eq!(even.len(), 8);
        assert_eq!(odd.len(), 8);
    }

    #[test]
    fn begin_frame_resets_prior_contents() {
        let mut buf = buffer(4, 4, Kernel::uniform(2, 2, 10));
        buf.begin_frame(true);
        buf.stamp(GridCell::new(1, 1));
        buf.begin_frame(true);
        assert!(buf.tempo_values().iter().all(|&v| v == 0));
        assert!(buf.raw_values().iter().all(|&v| v == 0));
    }
}
