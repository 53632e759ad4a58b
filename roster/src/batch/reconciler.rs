//! Reconciler - apply a batch outcome to the in-memory roster

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::{BatchAction, BatchOutcome, FailureReason};
use crate::domain::{MemberCollection, MemberId, TeamMember};
use crate::selection::SelectionTracker;

/// What reconciliation changed, plus the untouched failures for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Members removed by a delete batch
    pub removed: Vec<TeamMember>,
    /// Ids whose fields were overwritten by an update batch
    pub updated: Vec<MemberId>,
    /// Succeeded ids that were no longer in the collection
    pub missing: Vec<MemberId>,
    /// Copied verbatim from the outcome
    pub failed: BTreeMap<MemberId, FailureReason>,
}

pub struct Reconciler;

impl Reconciler {
    /// Apply `outcome` to `collection` and deselect succeeded ids
    ///
    /// Failed ids are left exactly as they were, both in the collection and in
    /// the selection, so the user can retry or inspect them.
    pub fn reconcile(
        outcome: &BatchOutcome,
        action: &BatchAction,
        collection: &mut MemberCollection,
        selection: &mut SelectionTracker,
    ) -> ReconcileReport {
        debug!(
            kind = %action.kind(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "reconcile: called"
        );
        let mut report = ReconcileReport {
            failed: outcome.failed.clone(),
            ..Default::default()
        };

        for id in &outcome.succeeded {
            match action {
                BatchAction::Delete => match collection.remove(id) {
                    Some(member) => report.removed.push(member),
                    None => report.missing.push(id.clone()),
                },
                BatchAction::Update(payload) => match collection.get_mut(id) {
                    Some(member) => {
                        payload.apply_to(member);
                        report.updated.push(id.clone());
                    }
                    None => report.missing.push(id.clone()),
                },
            }
            selection.toggle(id.clone(), false);
        }

        if !report.missing.is_empty() {
            warn!(missing = ?report.missing, "reconcile: succeeded ids not in collection");
        }
        report
    }
}
