//! Fixed-capacity crash event log.
//!
//! Events are kept in a ring buffer in insertion (chronological) order. When
//! the log is full the oldest event is evicted; appending never fails.
//!
//! Serial ids come from a counter owned by the log, independent of where an
//! event sits in the buffer. Ids start at 1, are never reused and never reset
//! while the log exists.

use std::collections::vec_deque::{self, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::orientation::OrientationLabel;
use crate::position::Fix;

/// Default number of events retained.
pub const DEFAULT_CAPACITY: usize = 20;

/// A recorded crash.
///
/// Holds a copy of the fix at detection time, so later position updates never
/// alter a stored event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashEvent {
    /// Serial id, strictly increasing across the life of the log.
    pub id: u64,
    /// Orientation at the moment of detection. Never `Normal`.
    pub label: OrientationLabel,
    /// Fix at the moment of detection.
    pub fix: Fix,
}

/// Counters describing the log's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EventLogStats {
    /// Events currently stored.
    pub stored: usize,
    /// Maximum number of events stored.
    pub capacity: usize,
    /// Events ever appended.
    pub total_appended: u64,
    /// Events dropped to make room.
    pub evicted: u64,
}

/// Ring buffer of crash events.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<CrashEvent>,
    capacity: usize,
    next_id: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    /// Create an empty log holding up to `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Record a crash, evicting the oldest event if the log is full.
    ///
    /// Returns the stored event with its assigned serial id.
    pub fn append(&mut self, label: OrientationLabel, fix: Fix) -> CrashEvent {
        debug_assert!(!label.is_normal(), "Normal is never recorded as a crash");

        if self.events.len() == self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                debug!(id = evicted.id, "event log full, evicting oldest entry");
            }
        }

        let event = CrashEvent {
            id: self.next_id,
            label,
            fix,
        };
        self.next_id += 1;
        self.events.push_back(event);
        event
    }

    /// View the stored events, oldest first, without mutating the log.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            events: &self.events,
        }
    }

    /// Number of events currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events ever appended.
    #[must_use]
    pub fn total_appended(&self) -> u64 {
        self.next_id - 1
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> EventLogStats {
        let stored = self.events.len();
        let total_appended = self.total_appended();
        EventLogStats {
            stored,
            capacity: self.capacity,
            total_appended,
            // usize -> u64 is lossless on supported targets.
            evicted: total_appended - stored as u64,
        }
    }
}

/// A read-only, restartable view of the log in chronological order.
///
/// Each call to [`Snapshot::iter`] starts again from the oldest event.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    events: &'a VecDeque<CrashEvent>,
}

impl<'a> Snapshot<'a> {
    /// Iterate over the events, oldest first.
    #[must_use]
    pub fn iter(&self) -> vec_deque::Iter<'a, CrashEvent> {
        self.events.iter()
    }

    /// Number of events in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recent event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&'a CrashEvent> {
        self.events.back()
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = &'a CrashEvent;
    type IntoIter = vec_deque::Iter<'a, CrashEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &Snapshot<'a> {
    type Item = &'a CrashEvent;
    type IntoIter = vec_deque::Iter<'a, CrashEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
