//! Resume queue
//!
//! FIFO of contents waiting for their capture resources. Acquisition is
//! spread over idle loop turns, one content per turn, so a burst of new
//! windows does not stall the loop with native round-trips.

use std::collections::VecDeque;

use tracing::trace;

use super::ContentId;
use crate::config::ResumePriority;

/// Scheduled idle callback draining the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSource {
    pub priority: ResumePriority,
}

/// Invariant: `idle.is_some() == !entries.is_empty()`, entries are unique.
#[derive(Debug, Default)]
pub struct ResumeQueue {
    entries: VecDeque<ContentId>,
    idle: Option<IdleSource>,
}

impl ResumeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `id` unless already queued, arming the idle source if needed.
    /// Returns whether the entry was added.
    pub fn push(&mut self, id: ContentId, priority: ResumePriority) -> bool {
        if self.entries.contains(&id) {
            return false;
        }
        self.entries.push_back(id);
        if self.idle.is_none() {
            trace!("Arming resume idle source ({:?})", priority);
            self.idle = Some(IdleSource { priority });
        }
        true
    }

    /// Drop `id` from the queue; the idle source is cancelled once empty.
    pub fn remove(&mut self, id: ContentId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != id);
        let removed = self.entries.len() != before;
        if self.entries.is_empty() {
            self.idle = None;
        }
        removed
    }

    /// Take the head for one idle invocation; the idle source stays armed
    /// only while entries remain.
    pub fn pop(&mut self) -> Option<ContentId> {
        let head = self.entries.pop_front();
        if self.entries.is_empty() {
            self.idle = None;
        }
        head
    }

    /// Re-create the idle source with a new priority
    pub fn rearm(&mut self, priority: ResumePriority) {
        if !self.entries.is_empty() {
            self.idle = Some(IdleSource { priority });
        }
    }

    /// Cancel the idle source and forget every entry
    pub fn clear(&mut self) {
        self.idle = None;
        self.entries.clear();
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.entries.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn idle(&self) -> Option<IdleSource> {
        self.idle
    }
}
