//! The upstream boundary: blob positions from an external visual tracker.

use crate::Point;

/// Identifier the tracker assigns to a followed silhouette.
pub type BlobId = u32;

/// One tracked silhouette's centroid in normalized [0,1]x[0,1] space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Tracker-assigned identity, stable while the silhouette is followed.
    pub id: BlobId,
    /// Centroid position.
    pub pos: Point,
}

/// `BlobSource`
///
/// A typed, clearable iterator that emits [`Blob`]s when iterated upon. The
/// pipeline only ever drains one of these once per tick, so any buffering or
/// threading lives behind the implementation.
pub trait BlobSource: Iterator<Item = Blob> {
    /// Discards everything currently buffered.
    fn clear(&mut self);
}
