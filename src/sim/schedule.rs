//! Scheduled actions keyed by simulated time
//!
//! Delayed reactions (ending an attempt once the result has been shown) are
//! queued here and polled once per tick, so they follow simulated time rather
//! than the wall clock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Scheduled<A> {
    at: f64,
    action: A,
}

/// Time-ordered queue; actions due at the same time come out in FIFO order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventQueue<A> {
    entries: Vec<Scheduled<A>>,
}

impl<A> Default for EventQueue<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A> EventQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: f64, action: A) {
        // After every entry due at or before `at`, so ties keep insertion order
        let index = self.entries.partition_point(|e| e.at <= at);
        self.entries.insert(index, Scheduled { at, action });
    }

    /// Remove and return every action due at or before `now`
    pub fn poll(&mut self, now: f64) -> Vec<A> {
        let due = self.entries.partition_point(|e| e.at <= now);
        self.entries.drain(..due).map(|e| e.action).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
