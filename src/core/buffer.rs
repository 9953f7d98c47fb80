//! Bounded packet buffer - the source of truth for what is on screen
//!
//! Holds the most recent `capacity` packets, oldest first. Ids are handed out
//! from a monotonic counter and only the oldest entries are ever evicted, so
//! the buffered ids always form the contiguous range `[oldest, next_id)`.

use std::collections::VecDeque;
use tracing::trace;

use super::{EventId, PacketMessage, TelemetryEvent};

/// Reference capacity: the last 100 packets plus the one just received
pub const DEFAULT_CAPACITY: usize = 101;

/// Ring buffer of packet events with identity assignment
#[derive(Debug)]
pub struct PacketBuffer {
    events: VecDeque<TelemetryEvent>,
    capacity: usize,
    /// Next id to assign; also the total number of packets ever appended
    next_id: EventId,
    total_evicted: u64,
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PacketBuffer {
    /// Create a buffer holding at most `capacity` events (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 0,
            total_evicted: 0,
        }
    }

    /// Append a packet, evicting the oldest entries beyond capacity.
    /// Returns the id assigned to the new event.
    #[inline]
    pub fn append(&mut self, msg: PacketMessage) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push_back(TelemetryEvent::from_message(id, msg));

        while self.events.len() > self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                self.total_evicted += 1;
                trace!(id = evicted.id, "Packet evicted");
            }
        }
        id
    }

    /// Borrowed view of the current contents.
    /// Only obtainable between appends, never mid-append.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            events: &self.events,
            start: self.next_id - self.events.len() as u64,
            end: self.next_id,
        }
    }

    /// Bumped on every append; used to skip redundant reconciliation
    pub fn revision(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_appended(&self) -> u64 {
        self.next_id
    }

    pub fn total_evicted(&self) -> u64 {
        self.total_evicted
    }

    /// Most recently appended event
    pub fn latest(&self) -> Option<&TelemetryEvent> {
        self.events.back()
    }
}

/// Ordered, read-only view of the buffer contents
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    events: &'a VecDeque<TelemetryEvent>,
    start: EventId,
    end: EventId,
}

impl<'a> Snapshot<'a> {
    /// Whether an event with this id is still buffered. O(1).
    #[inline]
    pub fn contains(&self, id: EventId) -> bool {
        id >= self.start && id < self.end
    }

    /// Events oldest first
    pub fn iter(&self) -> impl Iterator<Item = &'a TelemetryEvent> + 'a {
        let events = self.events;
        events.iter()
    }

    /// Buffered ids oldest first
    pub fn ids(&self) -> impl Iterator<Item = EventId> + 'a {
        self.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Revision of the buffer this snapshot was taken from
    pub fn revision(&self) -> u64 {
        self.end
    }
}
