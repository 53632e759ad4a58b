//! BatchOutcome - aggregate result of one batch action

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::BatchKind;
use crate::domain::MemberId;

/// Why one id in a batch failed, as reported by the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct FailureReason {
    pub message: String,
    /// Whether sending the same operation again could succeed
    #[serde(default)]
    pub retryable: bool,
}

impl FailureReason {
    /// A transient failure; retry rounds may re-send it
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure that will not change on a retry (bad request, missing member)
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Coarse classification of an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Nothing was requested
    Noop,
    Succeeded,
    Partial,
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => write!(f, "noop"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Every requested id lands in exactly one of `succeeded` or `failed`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: BTreeSet<MemberId>,
    pub failed: BTreeMap<MemberId, FailureReason>,
}

impl BatchOutcome {
    /// The "nothing to do" outcome
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an outcome from per-id settled results
    ///
    /// If an id shows up twice the last result wins, so the two sides stay
    /// disjoint.
    pub fn from_settled<T, I>(settled: I) -> Self
    where
        I: IntoIterator<Item = (MemberId, Result<T, FailureReason>)>,
    {
        let mut outcome = Self::empty();
        for (id, result) in settled {
            match result {
                Ok(_) => outcome.record_success(id),
                Err(reason) => outcome.record_failure(id, reason),
            }
        }
        debug!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "BatchOutcome::from_settled: aggregated"
        );
        outcome
    }

    pub fn record_success(&mut self, id: MemberId) {
        self.failed.remove(&id);
        self.succeeded.insert(id);
    }

    pub fn record_failure(&mut self, id: MemberId, reason: FailureReason) {
        self.succeeded.remove(&id);
        self.failed.insert(id, reason);
    }

    pub fn is_noop(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn status(&self) -> BatchStatus {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (true, true) => BatchStatus::Noop,
            (false, true) => BatchStatus::Succeeded,
            (true, false) => BatchStatus::Failed,
            (false, false) => BatchStatus::Partial,
        }
    }

    pub fn failed_ids(&self) -> BTreeSet<MemberId> {
        self.failed.keys().cloned().collect()
    }

    /// Failed ids whose reason allows another attempt
    pub fn retryable_ids(&self) -> BTreeSet<MemberId> {
        self.failed
            .iter()
            .filter(|(_, reason)| reason.retryable)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// True when the outcome accounts for exactly `requested`, each id once
    pub fn covers(&self, requested: &BTreeSet<MemberId>) -> bool {
        let disjoint = self.succeeded.iter().all(|id| !self.failed.contains_key(id));
        let union: BTreeSet<&MemberId> = self.succeeded.iter().chain(self.failed.keys()).collect();
        disjoint && union.len() == requested.len() && requested.iter().all(|id| union.contains(id))
    }

    /// Fold a retry round into this outcome
    ///
    /// The retry only covers ids that failed here, so anything it settles
    /// replaces the earlier failure.
    pub fn absorb_retry(&mut self, retry: BatchOutcome) {
        for id in retry.succeeded {
            self.record_success(id);
        }
        for (id, reason) in retry.failed {
            self.record_failure(id, reason);
        }
    }

    /// One-line human summary, e.g. "3 of 5 deleted; 2 failed: 2: not found, 4: timeout"
    pub fn summary(&self, kind: BatchKind) -> String {
        let verb = kind.past_tense();
        match self.status() {
            BatchStatus::Noop => "nothing selected".to_string(),
            BatchStatus::Succeeded => format!("all {} {}", self.succeeded.len(), verb),
            BatchStatus::Partial | BatchStatus::Failed => {
                let reasons = self
                    .failed
                    .iter()
                    .map(|(id, reason)| format!("{}: {}", id, reason))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{} of {} {}; {} failed: {}",
                    self.succeeded.len(),
                    self.total(),
                    verb,
                    self.failed.len(),
                    reasons
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> BTreeSet<MemberId> {
        raw.iter().map(|n| MemberId::from(*n)).collect()
    }

    #[test]
    fn test_from_settled_mixed() {
        let outcome = BatchOutcome::from_settled(vec![
            (MemberId::from(1), Ok(())),
            (MemberId::from(2), Err(FailureReason::new("Member not found"))),
            (MemberId::from(3), Ok(())),
        ]);

        assert_eq!(outcome.succeeded, ids(&[1, 3]));
        assert_eq!(outcome.failed[&MemberId::from(2)].message, "Member not found");
        assert_eq!(outcome.status(), BatchStatus::Partial);
        assert!(outcome.covers(&ids(&[1, 2, 3])));
    }

    #[test]
    fn test_empty_is_noop_and_covers_empty() {
        let outcome = BatchOutcome::empty();
        assert!(outcome.is_noop());
        assert_eq!(outcome.status(), BatchStatus::Noop);
        assert!(outcome.covers(&BTreeSet::new()));
        assert_eq!(outcome.summary(BatchKind::Delete), "nothing selected");
    }

    #[test]
    fn test_covers_rejects_missing_and_extra() {
        let outcome = BatchOutcome::from_settled(vec![(MemberId::from(1), Ok::<(), FailureReason>(()))]);
        assert!(!outcome.covers(&ids(&[1, 2])));
        assert!(!outcome.covers(&BTreeSet::new()));
    }

    #[test]
    fn test_last_result_wins_for_duplicate_id() {
        let outcome = BatchOutcome::from_settled(vec![
            (MemberId::from(1), Err(FailureReason::new("boom"))),
            (MemberId::from(1), Ok(())),
        ]);
        assert_eq!(outcome.succeeded, ids(&[1]));
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_retryable_ids_skip_permanent_failures() {
        let outcome = BatchOutcome::from_settled(vec![
            (MemberId::from(1), Ok(())),
            (MemberId::from(2), Err(FailureReason::new("timed out after 50ms"))),
            (MemberId::from(3), Err(FailureReason::permanent("API error 404: Member 3 not found"))),
        ]);
        assert_eq!(outcome.retryable_ids(), ids(&[2]));
        assert_eq!(outcome.failed_ids(), ids(&[2, 3]));
    }

    #[test]
    fn test_absorb_retry() {
        let mut first = BatchOutcome::from_settled(vec![
            (MemberId::from(1), Ok(())),
            (MemberId::from(2), Err(FailureReason::new("timeout"))),
            (MemberId::from(3), Err(FailureReason::new("timeout"))),
        ]);
        let retry = BatchOutcome::from_settled(vec![
            (MemberId::from(2), Ok(())),
            (MemberId::from(3), Err(FailureReason::new("still down"))),
        ]);
        first.absorb_retry(retry);

        assert_eq!(first.succeeded, ids(&[1, 2]));
        assert_eq!(first.failed[&MemberId::from(3)].message, "still down");
        assert!(first.covers(&ids(&[1, 2, 3])));
    }

    #[test]
    fn test_summary_partial() {
        let outcome = BatchOutcome::from_settled(vec![
            (MemberId::from(1), Ok(())),
            (MemberId::from(2), Err(FailureReason::new("Member not found"))),
            (MemberId::from(3), Ok(())),
        ]);
        assert_eq!(
            outcome.summary(BatchKind::Delete),
            "2 of 3 deleted; 1 failed: 2: Member not found"
        );
    }

    #[test]
    fn test_summary_success() {
        let outcome = BatchOutcome::from_settled(vec![(MemberId::from(1), Ok::<(), FailureReason>(()))]);
        assert_eq!(outcome.summary(BatchKind::Update), "all 1 updated");
        assert_eq!(outcome.status(), BatchStatus::Succeeded);
    }
}
