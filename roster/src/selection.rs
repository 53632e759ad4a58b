//! SelectionTracker - ids the user has ticked for the next batch action
//!
//! Pure local state: no I/O, no knowledge of the collection. Keeping the
//! selection consistent with the collection is the owner's job (see
//! [`SelectionTracker::retain`]).

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::MemberId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<MemberId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect one id; repeating the same call changes nothing
    pub fn toggle(&mut self, id: MemberId, is_selected: bool) {
        debug!(%id, is_selected, "SelectionTracker::toggle: called");
        if is_selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    pub fn clear(&mut self) {
        debug!(count = self.selected.len(), "SelectionTracker::clear: called");
        self.selected.clear();
    }

    pub fn current(&self) -> &BTreeSet<MemberId> {
        &self.selected
    }

    pub fn is_selected(&self, id: &MemberId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop every id the predicate rejects, returning the dropped ids
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<MemberId>
    where
        F: FnMut(&MemberId) -> bool,
    {
        let dropped: Vec<MemberId> = self.selected.iter().filter(|id| !keep(id)).cloned().collect();
        for id in &dropped {
            self.selected.remove(id);
        }
        if !dropped.is_empty() {
            debug!(?dropped, "SelectionTracker::retain: purged ids");
        }
        dropped
    }
}
