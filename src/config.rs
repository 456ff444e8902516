//! Installation settings, persisted as a single [ron] file.
//!
//! Everything an operator tunes on site lives here: grid size and area, the
//! intensity-to-BPM tempo table, the wiring rotation, serial device filter
//! and baud rate, and the handful of pipeline constants. A missing settings
//! file is not an error; every field falls back to the values observed on the
//! installed wall.

use crate::Rectf;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default intensity-to-BPM table: 60 to 220 in steps of 10.
pub const DEFAULT_TEMPO_TABLE: [u16; 17] = [
    60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160, 170, 180, 190, 200, 210, 220,
];

/// An ordered table of BPM values indexed by intensity bucket.
///
/// Bucket 0 of the raw intensity scale is reserved for "no value"; table
/// entry `i` corresponds to intensity bucket `i + 1`. Entries are clamped to
/// the configured `[min_bpm, max_bpm]` whenever they are edited, so 0 is
/// never a valid tempo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoTable {
    values: Vec<u16>,
    min_bpm: u16,
    max_bpm: u16,
}

impl Default for TempoTable {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO_TABLE.to_vec(), 30, 250)
    }
}

impl TempoTable {
    /// Builds a table, clamping every entry into `[min_bpm, max_bpm]`.
    pub fn new(values: Vec<u16>, min_bpm: u16, max_bpm: u16) -> Self {
        let mut table = Self {
            values: Vec::new(),
            min_bpm,
            max_bpm,
        };
        table.values = values
            .into_iter()
            .map(|bpm| bpm.clamp(min_bpm, max_bpm))
            .collect();
        table
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The BPM for a bucket index, or `None` past the end of the table.
    pub fn get(&self, bucket: usize) -> Option<u16> {
        self.values.get(bucket).copied()
    }

    /// Edits one entry, clamping to the configured bounds.
    ///
    /// Panics if `index` is out of range; the table never grows at runtime.
    pub fn set(&mut self, index: usize, bpm: u16) {
        self.values[index] = bpm.clamp(self.min_bpm, self.max_bpm);
    }

    /// All entries in bucket order.
    pub fn values(&self) -> &[u16] {
        &self.values
    }
}

/// The persisted installation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationConfig {
    /// Cells along one side of the metronome grid.
    pub grid_size: usize,
    /// Active sub-rectangle of the normalized tracker space.
    pub grid_area: Rectf,
    /// Intensity-to-BPM lookup.
    pub tempo_table: TempoTable,
    /// Apply the wiring rotation below when addressing devices.
    pub rotate: bool,
    /// Permutation from logical slot order to physical wiring order.
    pub rotation: Vec<usize>,
    /// Substring matched against serial device names during discovery.
    pub port_filter: String,
    /// Serial baud rate.
    pub baud: u32,
    /// Pipeline ticks per second.
    pub update_rate: f32,
    /// Tempo written to the whole raster while nobody is tracked.
    pub idle_tempo: u16,
    /// Per-cell tempo saturation ceiling; increments that would reach it are
    /// dropped.
    pub tempo_ceiling: f64,
    /// Offset subtracted from the mirrored stamp anchor.
    pub stamp_margin: usize,
    /// Number of addressable device slots (stereo pairs) on the wall.
    pub device_count: usize,
    /// Grayscale image asset used as the stamp kernel.
    pub kernel_path: PathBuf,
    /// Ticks a blob may go unreported before it is dropped from the merge.
    pub blob_staleness_ticks: u64,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            grid_area: Rectf::UNIT,
            tempo_table: TempoTable::default(),
            rotate: false,
            rotation: rotated_pair_permutation(10),
            port_filter: "usbserial".to_owned(),
            baud: 115_200,
            update_rate: 60.0,
            idle_tempo: 60,
            tempo_ceiling: 1640.0,
            stamp_margin: 1,
            device_count: 49,
            kernel_path: PathBuf::from("assets/kernel.pgm"),
            blob_staleness_ticks: 6,
        }
    }
}

/// Things that can go wrong while loading or saving the settings file.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    Io(io::Error),
    /// The file did not parse as RON.
    Parse(ron::de::SpannedError),
    /// Serializing the settings failed.
    Serialize(ron::Error),
    /// The grid area violates `x1 <= x2`, `y1 <= y2` inside [0,1].
    InvalidGridArea(Rectf),
    /// The grid has no cells, no devices, or fewer stereo pairs than devices.
    InvalidGrid,
    /// The rotation table is not a permutation of the device slots.
    InvalidRotation,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(error) => write!(f, "io error: {}", error),
            ConfigError::Parse(error) => write!(f, "settings parse error: {}", error),
            ConfigError::Serialize(error) => write!(f, "settings serialize error: {}", error),
            ConfigError::InvalidGridArea(area) => write!(f, "invalid grid area {:?}", area),
            ConfigError::InvalidGrid => {
                write!(f, "grid must be non-empty with a stereo pair per device")
            }
            ConfigError::InvalidRotation => {
                write!(f, "rotation table is not a permutation of the device slots")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ron::de::SpannedError> for ConfigError {
    fn from(value: ron::de::SpannedError) -> Self {
        Self::Parse(value)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(value: ron::Error) -> Self {
        Self::Serialize(value)
    }
}

impl InstallationConfig {
    /// Loads settings from `path`. A missing file yields the defaults; a file
    /// that exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the settings to `path` as RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Checks the structural invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = self.grid_area;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if a.x1 > a.x2
            || a.y1 > a.y2
            || ![a.x1, a.y1, a.x2, a.y2].into_iter().all(in_unit)
        {
            return Err(ConfigError::InvalidGridArea(a));
        }
        if self.grid_size == 0 || self.device_count == 0 {
            return Err(ConfigError::InvalidGrid);
        }
        // Each device slot reads one even and one odd raster entry; the odd
        // channel is the shorter of the two on an odd-sized raster.
        let pairs = self.grid_size * self.grid_size / 2;
        if self.device_count > pairs {
            return Err(ConfigError::InvalidGrid);
        }
        if self.rotate {
            if self.rotation.len() < self.device_count
                || !is_permutation(&self.rotation, self.rotation.len())
            {
                return Err(ConfigError::InvalidRotation);
            }
            if self.rotation[..self.device_count].iter().any(|&t| t >= pairs) {
                return Err(ConfigError::InvalidRotation);
            }
        }
        Ok(())
    }

    /// The wiring permutation to apply, or `None` when rotation is off.
    pub fn rotation_table(&self) -> Option<Vec<usize>> {
        self.rotate.then(|| self.rotation.clone())
    }
}

fn is_permutation(table: &[usize], len: usize) -> bool {
    if table.len() < len {
        return false;
    }
    let mut seen = vec![false; len];
    for &t in &table[..len] {
        if t >= len || seen[t] {
            return false;
        }
        seen[t] = true;
    }
    true
}

/// Builds the wiring permutation for an `n` x `n` logical matrix read as
/// stereo pairs (two adjacent cells per pair, `n / 2` pairs per row), with
/// the pair matrix rotated a quarter turn to match how the wall was cabled.
/// `n` must be even.
pub fn rotated_pair_permutation(n: usize) -> Vec<usize> {
    assert!(n % 2 == 0, "pair rotation needs an even grid size");
    let cols = n / 2;
    let mut table = Vec::with_capacity(cols * n);
    for row in 0..n {
        for col in 0..cols {
            table.push(col * n + (n - 1 - row));
        }
    }
    table
}
