//! The thread-safe buffer where decoded tracker messages wait for the next
//! pipeline tick.

use crate::tracker::{Blob, BlobSource};
use crate::tracker_decoder::BlobMessage;
use crate::Point;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// A [`BlobSource`] fed from the tracker-reader thread. Cloning shares the
/// underlying buffer, so one clone can live on the reader thread while the
/// pipeline drains another.
#[derive(Debug, Default, Clone)]
pub struct TrackerFeed {
    msgs: Arc<Mutex<VecDeque<Blob>>>,
}

impl TrackerFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        TrackerFeed {
            msgs: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Converts a decoded tracker message and queues it.
    pub fn add_message(&self, msg: BlobMessage) {
        let blob = Blob {
            id: msg.id,
            pos: Point { x: msg.x, y: msg.y },
        };
        self.msgs.lock().unwrap().push_back(blob);
    }
}

impl Iterator for TrackerFeed {
    type Item = Blob;

    fn next(&mut self) -> Option<Self::Item> {
        self.msgs.lock().unwrap().pop_front()
    }
}

impl BlobSource for TrackerFeed {
    fn clear(&mut self) {
        self.msgs.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_come_back_out_in_order() {
        let feed = TrackerFeed::new();
        feed.add_message(BlobMessage {
            id: 3,
            x: 0.25,
            y: 0.5,
        });
        feed.add_message(BlobMessage {
            id: 4,
            x: 0.75,
            y: 0.5,
        });

        let blobs: Vec<_> = feed.clone().collect();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].id, 3);
        assert_eq!(blobs[0].pos, Point { x: 0.25, y: 0.5 });
        assert_eq!(blobs[1].id, 4);
    }

    #[test]
    fn clear_drops_everything_buffered() {
        let mut feed = TrackerFeed::new();
        feed.add_message(BlobMessage {
            id: 1,
            x: 0.1,
            y: 0.1,
        });
        feed.clear();
        assert_eq!(feed.next(), None);
    }
}
