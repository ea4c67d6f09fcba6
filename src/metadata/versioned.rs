use super::Semilattice;
use crate::core::PeerId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Ordering primitive for field-level last-writer-wins.
///
/// `(tick, origin)` is a total order; the origin breaks ties between peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionStamp {
    pub tick: u64,
    pub origin: PeerId,
}

impl VersionStamp {
    pub fn new(tick: u64, origin: PeerId) -> Self {
        Self { tick, origin }
    }
}

impl PartialOrd for VersionStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then_with(|| self.origin.cmp(&other.origin))
    }
}

/// Issues version stamps for one peer.
///
/// Ticks follow the wall clock in milliseconds but never repeat or go
/// backwards for this peer, so two writes from the same peer never share a stamp.
#[derive(Debug)]
pub struct MetadataClock {
    peer: PeerId,
    last_tick: AtomicU64,
}

impl MetadataClock {
    pub fn new(peer: PeerId) -> Self {
        Self {
            peer,
            last_tick: AtomicU64::new(0),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Stamp for a freshly created field.
    pub fn initial_stamp(&self) -> VersionStamp {
        self.issue(0)
    }

    /// Stamp that supersedes `previous`.
    pub fn stamp_after(&self, previous: VersionStamp) -> VersionStamp {
        self.issue(previous.tick.saturating_add(1))
    }

    fn issue(&self, floor: u64) -> VersionStamp {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let next_from = |last: u64| now.max(floor).max(last.saturating_add(1));
        let last = self
            .last_tick
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |last| {
                Some(next_from(last))
            })
            .unwrap_or_else(|last| last);
        VersionStamp::new(next_from(last), self.peer)
    }
}

/// A value together with the stamp of its last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    value: T,
    stamp: VersionStamp,
}

impl<T> Versioned<T> {
    pub fn new(value: T, clock: &MetadataClock) -> Self {
        Self {
            value,
            stamp: clock.initial_stamp(),
        }
    }

    pub fn with_stamp(value: T, stamp: VersionStamp) -> Self {
        Self { value, stamp }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn stamp(&self) -> VersionStamp {
        self.stamp
    }

    /// Overwrites the value with a stamp newer than the current one.
    pub fn set(&mut self, value: T, clock: &MetadataClock) {
        self.stamp = clock.stamp_after(self.stamp);
        self.value = value;
    }
}

impl<T: Clone> Semilattice for Versioned<T> {
    fn join(&self, other: &Self) -> Self {
        if self.stamp >= other.stamp {
            self.clone()
        } else {
            other.clone()
        }
    }
}
