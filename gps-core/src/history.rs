//! Bounded, thread-safe history of recent fixes.
//!
//! One `Mutex` guards the whole ring: `push` and `snapshot` each take it
//! once and release it before returning, so a snapshot always observes a
//! state that existed between two complete pushes. No I/O happens under
//! the lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::snapshot::Snapshot;
use crate::types::Fix;

/// Number of fixes retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// FIFO ring of the most recent fixes, oldest evicted first.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    fixes: Mutex<VecDeque<Fix>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity below 1 is raised to 1 so the newest fix is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistoryStore {
            capacity,
            fixes: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a fix, evicting the oldest entries beyond capacity.
    pub fn push(&self, fix: Fix) {
        let mut fixes = self.lock();
        while fixes.len() >= self.capacity {
            fixes.pop_front();
        }
        fixes.push_back(fix);
    }

    /// Latest fix plus a copy of the full history, taken atomically.
    pub fn snapshot(&self) -> Snapshot {
        let fixes = self.lock();
        Snapshot {
            latest: fixes.back().copied().unwrap_or_else(Fix::zero),
            history: fixes.iter().copied().collect(),
        }
    }

    /// Most recent fix, or `None` before the first push.
    pub fn latest(&self) -> Option<Fix> {
        self.lock().back().copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Every critical section leaves the ring valid, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Fix>> {
        self.fixes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        HistoryStore::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
