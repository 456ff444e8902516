//! Merges raw tracker messages into the one blob list a tick consumes.
//!
//! The tracker reports centroids whenever it has them; the pipeline ticks on
//! its own clock. The `BlobAccumulator` sits between the two: it drains the
//! source, keeps the most recent position per blob id, and evicts blobs that
//! have gone quiet for longer than the staleness window.

use crate::tracker::{Blob, BlobId, BlobSource};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Drains a [`BlobSource`] and answers "where is everybody right now".
pub struct BlobAccumulator<S>
where
    S: BlobSource,
{
    source: Arc<Mutex<S>>,
    latest: HashMap<BlobId, (Blob, u64)>,
    tick: u64,
    staleness_ticks: u64,
}

impl<S> BlobAccumulator<S>
where
    S: BlobSource,
{
    /// Instantiates an accumulator attached to a source. Blobs unseen for
    /// more than `staleness_ticks` queries are dropped.
    pub fn new(source: Arc<Mutex<S>>, staleness_ticks: u64) -> Self {
        Self {
            source,
            latest: HashMap::new(),
            tick: 0,
            staleness_ticks,
        }
    }

    /// Returns the freshest known position of every live blob, in blob id
    /// order. Call exactly once per pipeline tick.
    pub fn get_status(&mut self) -> Vec<Blob> {
        self.tick += 1;
        let tick = self.tick;
        for blob in self.source.lock().unwrap().by_ref() {
            self.latest.insert(blob.id, (blob, tick));
        }

        let staleness = self.staleness_ticks;
        self.latest
            .retain(|_, (_, seen)| tick.saturating_sub(*seen) <= staleness);

        let mut blobs: Vec<Blob> = self.latest.values().map(|(blob, _)| *blob).collect();
        blobs.sort_by_key(|blob| blob.id);
        blobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct StubSource {
        queued: VecDeque<Blob>,
    }

    impl Iterator for StubSource {
        type Item = Blob;
        fn next(&mut self) -> Option<Blob> {
            self.queued.pop_front()
        }
    }

    impl BlobSource for StubSource {
        fn clear(&mut self) {
            self.queued.clear();
        }
    }

    fn blob(id: BlobId, x: f64) -> Blob {
        Blob {
            id,
            pos: Point { x, y: 0.5 },
        }
    }

    #[test]
    fn newest_position_per_blob_wins() {
        let source = Arc::new(Mutex::new(StubSource::default()));
        let mut acc = BlobAccumulator::new(source.clone(), 10);

        source
            .lock()
            .unwrap()
            .queued
            .extend([blob(1, 0.1), blob(2, 0.2), blob(1, 0.9)]);

        let status = acc.get_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].pos.x, 0.9);
        assert_eq!(status[1].pos.x, 0.2);
    }

    #[test]
    fn quiet_blobs_are_evicted_after_the_staleness_window() {
        let source = Arc::new(Mutex::new(StubSource::default()));
        let mut acc = BlobAccumulator::new(source.clone(), 2);

        source.lock().unwrap().queued.push_back(blob(5, 0.5));
        assert_eq!(acc.get_status().len(), 1);
        assert_eq!(acc.get_status().len(), 1);
        assert_eq!(acc.get_status().len(), 1);
        // Third empty query pushes it past the window.
        assert!(acc.get_status().is_empty());
    }

    #[test]
    fn a_refresh_restarts_the_window() {
        let source = Arc::new(Mutex::new(StubSource::default()));
        let mut acc = BlobAccumulator::new(source.clone(), 1);

        source.lock().unwrap().queued.push_back(blob(5, 0.5));
        assert_eq!(acc.get_status().len(), 1);
        source.lock().unwrap().queued.push_back(blob(5, 0.6));
        assert_eq!(acc.get_status().len(), 1);
        assert_eq!(acc.get_status().len(), 1);
        assert!(acc.get_status().is_empty());
    }
}
