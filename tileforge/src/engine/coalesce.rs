//! Per-coordinate request coalescing.
//!
//! Synthesis re-enters the orchestrator for up to four children and several
//! fallback ancestors, so a burst of viewport requests can easily ask for
//! the same coordinate many times at once. The coalescer ensures one
//! resolution runs per `(coordinate, canvas)` key: the first requester
//! becomes the leader and does the work, every concurrent duplicate
//! subscribes to a broadcast channel and receives the leader's result.
//!
//! Uses `DashMap` for lock-free registration; statistics are atomic
//! counters.

use crate::coord::TileCoord;
use crate::engine::plan::Canvas;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Identity of one in-flight resolution.
///
/// The canvas is part of the key: a doubled top-level resolution and a
/// standard nested resolution of the same coordinate produce different
/// bytes and must not share a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FlightKey {
    pub coord: TileCoord,
    pub canvas: Canvas,
}

/// Payload shared between coalesced requesters: the resolved bytes, or
/// `None` for an unavailable tile.
pub(crate) type FlightResult = Option<Bytes>;

/// Tracks in-flight resolutions for request coalescing.
pub(crate) struct RequestCoalescer {
    in_flight: DashMap<FlightKey, broadcast::Sender<FlightResult>>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
}

/// Outcome of registering a request.
pub(crate) enum Flight {
    /// First requester: resolve and call [`RequestCoalescer::complete`].
    Leader,
    /// Duplicate requester: await the leader's broadcast.
    Follower(broadcast::Receiver<FlightResult>),
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
        }
    }

    /// Registers a request for the given key.
    ///
    /// The entry API makes check-and-insert atomic, so exactly one caller
    /// per key becomes the leader no matter how requests race.
    pub fn register(&self, key: FlightKey) -> Flight {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self.in_flight.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                debug!(coord = %key.coord, "Coalescing onto in-flight resolution");
                Flight::Follower(entry.get().subscribe())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                // Capacity 8: the result is sent exactly once, the capacity
                // only bounds simultaneous subscribers per flight.
                let (tx, _rx) = broadcast::channel(8);
                entry.insert(tx);
                Flight::Leader
            }
        }
    }

    /// Completes a flight, broadcasting the result to all followers.
    pub fn complete(&self, key: FlightKey, result: FlightResult) {
        if let Some((_, tx)) = self.in_flight.remove(&key) {
            // Send errors just mean no follower is waiting.
            let _ = tx.send(result);
        }
    }

    /// Number of resolutions currently in flight.
    #[cfg(test)]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Total and coalesced request counts since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.coalesced_requests.load(Ordering::Relaxed),
        )
    }
}

impl Flight {
    /// Awaits the leader's result if this is a follower.
    ///
    /// Returns `None` for a leader. A closed channel (leader dropped without
    /// completing) yields an absent result rather than an error.
    pub async fn wait(self) -> Option<FlightResult> {
        match self {
            Flight::Leader => None,
            Flight::Follower(mut rx) => Some(rx.recv().await.unwrap_or(None)),
        }
    }
}
