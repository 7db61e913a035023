//! In-process fallback counter used when the remote store is unreachable.
//!
//! Spec §4.D: "in-process map indexed by identifier, single hourly window,
//! LRU pruning on every tick." Grounded on the teacher's `FixedWindowState`
//! (fixed-size period that resets wholesale rather than sliding), reduced to
//! one window since the fallback only needs to keep serving the hourly
//! quota while the remote store is down.

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    count: u64,
    window_start: Instant,
    last_touched: Instant,
}

pub struct FallbackLimiter {
    window: Duration,
    capacity: usize,
    entries: HashMap<String, Entry>,
}

impl FallbackLimiter {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity,
            entries: HashMap::new(),
        }
    }

    /// Increments the identifier's counter, rolling its window over if
    /// expired, and prunes the least-recently-touched entries down to
    /// capacity. Returns the post-increment count.
    pub fn incr(&mut self, identifier: &str) -> u64 {
        let now = Instant::now();
        let entry = self
            .entries
            .entry(identifier.to_string())
            .or_insert_with(|| Entry {
                count: 0,
                window_start: now,
                last_touched: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count += 1;
        entry.last_touched = now;
        let count = entry.count;

        self.evict_over_capacity();
        count
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
