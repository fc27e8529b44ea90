//! Collision events and the bounded per-manager event queue.
//!
//! Events are produced during narrow-phase resolution and drained once
//! per frame by the host. The queue is an owned field of the simulation
//! context, so independent simulations never share hidden state.

use std::collections::VecDeque;

use fenrir_math::{Fixed, FixedVec3};

use crate::body::BodyId;

/// A resolved contact between two bodies, or between a body and the
/// ground plane (see [`crate::body::GROUND_BODY_ID`]).
#[derive(Clone, Copy, Debug)]
pub struct CollisionEvent {
    /// First participant.
    pub body_a: BodyId,
    /// Second participant, or the ground sentinel.
    pub body_b: BodyId,
    /// Contact normal, pointing from `body_a` toward `body_b`.
    pub normal: FixedVec3,
    /// Approximate contact point in world space.
    pub contact: FixedVec3,
    /// Scalar impulse magnitude applied along the normal.
    pub impulse: Fixed,
}

/// Bounded FIFO of collision events. When full, the oldest event is
/// dropped so a frame with a pile-up never grows unbounded.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<CollisionEvent>,
    capacity: usize,
}

/// Default queue capacity: enough for the worst combat frame observed
/// in practice, small enough to drop stale events instead of growing.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

impl EventQueue {
    /// Create a queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }

    /// Create a queue with an explicit capacity (tests use small ones).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an event, dropping the oldest if the queue is full.
    pub fn push(&mut self, event: CollisionEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate events oldest-first without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.iter()
    }

    /// Drain all events oldest-first. The host calls this once per frame.
    pub fn drain(&mut self) -> impl Iterator<Item = CollisionEvent> + '_ {
        self.events.drain(..)
    }

    /// Discard all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
