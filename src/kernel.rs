//! The stamp kernel: a small read-only grayscale raster that is added into
//! the accumulation buffers at every occupied cell's anchor position. The
//! production kernel is an external image asset; the sample values double as
//! tempo-table bucket indices (see [`crate::accumulator`]).

use std::fmt::{self, Display};
use std::path::Path;

/// A fixed 2-D array of unsigned intensity samples, read-only after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

/// Things that can go wrong while loading a kernel asset.
#[derive(Debug)]
pub enum KernelError {
    /// The image file could not be decoded.
    Image(image::ImageError),
    /// The decoded image had a zero dimension.
    Empty,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Image(error) => write!(f, "kernel image error: {}", error),
            KernelError::Empty => write!(f, "kernel image has a zero dimension"),
        }
    }
}

impl std::error::Error for KernelError {}

impl From<image::ImageError> for KernelError {
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

impl Kernel {
    /// Loads a kernel from a grayscale image asset. Color images are
    /// converted to luma first.
    pub fn load(path: &Path) -> Result<Self, KernelError> {
        let luma = image::open(path)?.to_luma8();
        let (width, height) = (luma.width() as usize, luma.height() as usize);
        if width == 0 || height == 0 {
            return Err(KernelError::Empty);
        }
        Ok(Self {
            width,
            height,
            samples: luma.into_raw(),
        })
    }

    /// Builds a kernel by sampling `f(x, y)` over a `width` x `height` grid.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Self {
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    /// A kernel where every sample has the same value. Handy in tests.
    pub fn uniform(width: usize, height: usize, value: u8) -> Self {
        Self::from_fn(width, height, |_, _| value)
    }

    /// The built-in fallback stamp used when the image asset is missing: a
    /// 3x3 signature with a hot center and a soft rim.
    pub fn default_stamp() -> Self {
        Self::from_fn(3, 3, |x, y| match (x, y) {
            (1, 1) => 170,
            (1, _) | (_, 1) => 60,
            _ => 30,
        })
    }

    /// Width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The sample at `(x, y)`.
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    /// Iterates over `(x, y, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        let width = self.width;
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % width, i / width, v))
    }
}
