//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{Issue, IssueId};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
pub(crate) struct InMemoryStorageInner {
    /// Issues indexed by ID for O(1) lookups
    pub(super) issues: HashMap<IssueId, Issue>,

    /// ID generator for creating new issue IDs
    id_generator: IdGenerator,

    /// Last timestamp handed out by [`Self::tick`]
    last_tick: Option<DateTime<Utc>>,
}

impl InMemoryStorageInner {
    /// Create a new empty storage instance
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            issues: HashMap::new(),
            id_generator: IdGenerator::new(prefix),
            last_tick: None,
        }
    }

    /// Generate a new unique ID for an issue
    pub(super) fn generate_id(&mut self) -> Result<IssueId> {
        let id = self
            .id_generator
            .generate()
            .map_err(|e| Error::Storage(format!("ID generation failed: {e}")))?;
        Ok(IssueId::new(id))
    }

    /// Register an imported ID so generated IDs never collide with it
    pub(super) fn register_id(&mut self, id: &IssueId) {
        self.id_generator.register_id(id.as_str().to_string());
    }

    /// Current time on the store clock.
    ///
    /// Strictly greater than every timestamp previously returned, even when
    /// the wall clock has not advanced (or went backwards) since.
    pub(super) fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    /// Make sure future ticks come after an imported timestamp
    pub(super) fn observe(&mut self, timestamp: DateTime<Utc>) {
        if self.last_tick.is_none_or(|last| timestamp > last) {
            self.last_tick = Some(timestamp);
        }
    }
}
