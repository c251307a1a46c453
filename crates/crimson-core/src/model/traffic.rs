// ── Traffic samples and the rolling window ──

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unstamped reading from a traffic source, in Mbps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficReading {
    pub upload_mbps: f64,
    pub download_mbps: f64,
}

/// A reading stamped with the time it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub timestamp: DateTime<Utc>,
    pub upload_mbps: f64,
    pub download_mbps: f64,
}

impl TrafficSample {
    pub fn new(timestamp: DateTime<Utc>, reading: TrafficReading) -> Self {
        Self {
            timestamp,
            upload_mbps: reading.upload_mbps,
            download_mbps: reading.download_mbps,
        }
    }
}

/// Fixed-capacity FIFO of samples, oldest first.
#[derive(Debug, Clone)]
pub struct TrafficWindow {
    samples: VecDeque<TrafficSample>,
    capacity: usize,
}

impl TrafficWindow {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `sample`, returning the evicted oldest entry if the window was full.
    pub fn push(&mut self, sample: TrafficSample) -> Option<TrafficSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&TrafficSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TrafficSample> {
        self.samples.iter().copied().collect()
    }
}
