//! Presence publisher.
//!
//! Converts a settled [`DayState`] into the wire snapshot and pushes it to
//! the shared store, from which supervisors and the chat layer derive
//! presence. Failures here are expected to be dropped by the caller after
//! logging; the next flush carries a strictly newer snapshot anyway.

use std::sync::Arc;

use desk_protocol::UserProfile;

use crate::error::{DeskError, Result};
use crate::ledger::DayState;
use crate::store::SnapshotStore;

pub struct PresencePublisher {
    store: Arc<dyn SnapshotStore>,
}

impl PresencePublisher {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn publish(&self, profile: &UserProfile, state: &DayState) -> Result<()> {
        let snapshot = state.to_snapshot(profile);
        if let Err(err) = snapshot.validate() {
            return Err(DeskError::StoreUnavailable(format!(
                "refusing to publish malformed snapshot: {}",
                err
            )));
        }
        self.store.put(snapshot)
    }
}
