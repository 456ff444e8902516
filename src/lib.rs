//! Metrogrid drives an interactive installation: a wall of physical metronome
//! devices laid out on a fixed grid. An external depth-camera tracker watches
//! the space in front of the wall and reports the centroids of human
//! silhouettes ("blobs"). Each blob is mapped onto a grid cell, every occupied
//! cell stamps a small kernel raster into a pair of accumulation buffers, and
//! the resulting per-cell tempo values are streamed to the metronomes over a
//! serial line, one device per animation frame, with a periodic sync command
//! and an automatic reset when tracking is lost.
//!
//! Camera capture, blob detection and audio synthesis live outside this crate;
//! the tracker hands us normalized centroid positions as ASCII lines and the
//! metronome wall is a write-only serial device.

#![warn(missing_docs)]
pub mod accumulator;
pub mod args;
pub mod blob_accumulator;
pub mod config;
pub mod dummy_tracker;
pub mod grid;
pub mod gui;
pub mod kernel;
pub mod pipeline;
pub mod scheduler;
pub mod serial_link;
pub mod tracker;
pub mod tracker_decoder;
pub mod tracker_feed;
pub mod transport;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A position in the normalized [0,1]x[0,1] tracker space.
#[derive(Debug, Default, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, 0 is the left edge of the camera view.
    pub x: f64,
    /// Vertical coordinate, 0 is the top edge of the camera view.
    pub y: f64,
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// An axis-aligned rectangle, usually in normalized coordinate space.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Default, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Rectf {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl Rectf {
    /// The full normalized space, [0,1]x[0,1].
    pub const UNIT: Rectf = Rectf {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    /// Builds a rectangle from its extents.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Containment test, inclusive on all four edges. A point sitting exactly
    /// on a shared edge is inside every rectangle touching that edge, so a
    /// blob on a cell boundary registers in several cells at once. The grid
    /// mapper keeps this behavior.
    pub fn contains(&self, pt: &Point) -> bool {
        pt.x >= self.x1 && pt.x <= self.x2 && pt.y >= self.y1 && pt.y <= self.y2
    }

    /// Center of the rectangle.
    pub fn center(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }
}

/// A linear mapping from one rectangle onto another, used to project
/// normalized grid coordinates onto a debug display surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectMapping {
    src: Rectf,
    dst: Rectf,
}

impl RectMapping {
    /// Maps points in `src` onto `dst`.
    pub fn new(src: Rectf, dst: Rectf) -> Self {
        Self { src, dst }
    }

    /// The identity mapping over the unit square.
    pub fn identity() -> Self {
        Self::new(Rectf::UNIT, Rectf::UNIT)
    }

    /// Projects a point through the mapping.
    pub fn map(&self, pt: Point) -> Point {
        Point {
            x: self.dst.x1 + (pt.x - self.src.x1) / self.src.width() * self.dst.width(),
            y: self.dst.y1 + (pt.y - self.src.y1) / self.src.height() * self.dst.height(),
        }
    }
}

/// One square of the N x N metronome grid: `(column, row)` with both
/// components in `[0, N)`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct GridCell {
    /// Column, counted from the left.
    pub col: usize,
    /// Row, counted from the top.
    pub row: usize,
}

impl GridCell {
    /// Builds a cell coordinate.
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.col, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_every_edge() {
        let rect = Rectf::new(0.25, 0.25, 0.5, 0.5);
        for pt in [
            Point { x: 0.25, y: 0.3 },
            Point { x: 0.5, y: 0.3 },
            Point { x: 0.3, y: 0.25 },
            Point { x: 0.3, y: 0.5 },
        ] {
            assert!(rect.contains(&pt), "{pt} should be inside {rect:?}");
        }
        assert!(!rect.contains(&Point { x: 0.501, y: 0.3 }));
    }

    #[test]
    fn rect_mapping_projects_between_spaces() {
        let mapping = RectMapping::new(Rectf::UNIT, Rectf::new(0.0, 0.0, 640.0, 480.0));
        let mapped = mapping.map(Point { x: 0.5, y: 0.25 });
        assert_eq!(mapped, Point { x: 320.0, y: 120.0 });
    }
}
