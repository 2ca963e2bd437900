//! Ramp-completion notifications.

use alloc::vec::Vec;

use crate::error::{try_with_capacity, Result};

/// A channel finished its ramp during the last block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampEnd {
    /// Input channel index.
    pub channel: usize,
    /// Slot the ramp targeted, `None` for scratch-driven ramps.
    pub slot: Option<usize>,
}

/// Fixed-capacity queue of [`RampEnd`] notifications.
///
/// A channel completes at most once per block, so a capacity equal to the
/// channel count never overflows. The queue is cleared at the start of every
/// block and pushes never reallocate.
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: Vec<RampEnd>,
}

impl EventQueue {
    /// Allocates room for `capacity` notifications.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            events: try_with_capacity(capacity)?,
        })
    }

    /// Pending notifications, in channel order.
    pub fn as_slice(&self) -> &[RampEnd] {
        &self.events
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no notification is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }

    /// Records a notification. Dropped if the queue is full.
    pub(crate) fn push(&mut self, event: RampEnd) {
        if self.events.len() < self.events.capacity() {
            self.events.push(event);
        }
    }
}
