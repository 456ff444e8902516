//! A synthetic blob source for running the installation with no camera and
//! no tracker process: a handful of blobs random-walk around the normalized
//! space on a background thread.

use crate::tracker::{Blob, BlobSource};
use crate::Point;
use rand::prelude::*;
use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A [`BlobSource`] that invents its own blobs.
pub struct DummyTracker {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    msgs: Arc<Mutex<VecDeque<Blob>>>,
}

enum Signal {
    BlobCount(usize),
    Speed(f64),
    Stop,
}

/// Configures and spawns a [`DummyTracker`].
pub struct DummyTrackerBuilder {
    blob_count: usize,
    speed: f64,
    interval: Duration,
}

impl Default for DummyTrackerBuilder {
    fn default() -> Self {
        Self {
            blob_count: 1,
            speed: 0.01,
            interval: Duration::from_millis(50),
        }
    }
}

impl DummyTrackerBuilder {
    /// How many blobs to simulate.
    pub fn blob_count(mut self, blob_count: usize) -> Self {
        self.blob_count = blob_count;
        self
    }

    /// Maximum per-step movement in normalized units.
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Delay between simulated tracker reports.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the walker thread and returns the source.
    pub fn build(self) -> DummyTracker {
        let (tx, rx) = mpsc::channel::<Signal>();
        let msgs = Arc::new(Mutex::new(VecDeque::new()));
        let th_msgs = Arc::clone(&msgs);
        let interval = self.interval;

        let handle = thread::spawn(move || {
            let mut rng = thread_rng();
            let mut blob_count = self.blob_count;
            let mut speed = self.speed;
            let mut positions: Vec<Point> = Vec::new();
            let mut running = true;

            while running {
                if let Ok(received) = rx.try_recv() {
                    match received {
                        Signal::BlobCount(new_count) => blob_count = new_count,
                        Signal::Speed(new_speed) => speed = new_speed,
                        Signal::Stop => running = false,
                    }
                }

                positions.resize_with(blob_count, || Point {
                    x: rng.gen_range(0.0..1.0),
                    y: rng.gen_range(0.0..1.0),
                });
                for pos in positions.iter_mut() {
                    pos.x = (pos.x + rng.gen_range(-speed..=speed)).clamp(0.0, 1.0);
                    pos.y = (pos.y + rng.gen_range(-speed..=speed)).clamp(0.0, 1.0);
                }

                let mut queue = th_msgs.lock().unwrap();
                for (i, pos) in positions.iter().enumerate() {
                    queue.push_back(Blob {
                        id: i as u32,
                        pos: *pos,
                    });
                }
                drop(queue);
                thread::sleep(interval);
            }
        });

        DummyTracker {
            handle: Some(handle),
            tx,
            msgs,
        }
    }
}

impl DummyTracker {
    /// Starts configuring a tracker.
    pub fn builder() -> DummyTrackerBuilder {
        DummyTrackerBuilder::default()
    }

    /// Changes the number of simulated blobs.
    pub fn set_blob_count(&self, blob_count: usize) {
        let _ = self.tx.send(Signal::BlobCount(blob_count));
    }

    /// Changes the walk speed.
    pub fn set_speed(&self, speed: f64) {
        let _ = self.tx.send(Signal::Speed(speed));
    }

    /// Stops the walker thread and waits for it.
    pub fn stop(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(thread) = self.handle.take() {
            let _ = thread.join();
        }
    }
}

impl Iterator for DummyTracker {
    type Item = Blob;
    fn next(&mut self) -> Option<Self::Item> {
        self.msgs.lock().unwrap().pop_front()
    }
}

impl BlobSource for DummyTracker {
    fn clear(&mut self) {
        self.msgs.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walker_emits_normalized_blobs() {
        let mut tracker = DummyTracker::builder()
            .blob_count(3)
            .interval(Duration::from_millis(5))
            .build();
        thread::sleep(Duration::from_millis(40));
        tracker.stop();

        let blobs: Vec<_> = tracker.by_ref().collect();
        assert!(!blobs.is_empty());
        assert!(blobs
            .iter()
            .all(|b| (0.0..=1.0).contains(&b.pos.x) && (0.0..=1.0).contains(&b.pos.y)));
        assert!(blobs.iter().all(|b| b.id < 3));
    }
}
