//! Batch workflow - selection -> coordinator -> reconciler
//!
//! Ties the pieces together for one user-triggered batch action: read the
//! selection from the [`RosterManager`], run it through the
//! [`BulkCoordinator`], apply the outcome, and optionally re-run only the ids
//! that failed.

use serde::Serialize;
use tracing::{debug, info};

use crate::batch::{BatchAction, BatchKind, BatchOutcome, BulkCoordinator, ReconcileReport, RemoteOperation};
use crate::domain::TeamMember;
use crate::state::{RosterManager, StateResponse};

/// Everything a caller needs to present a finished batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub kind: BatchKind,
    /// Number of dispatch rounds run (0 when nothing was selected)
    pub rounds: u32,
    /// Combined outcome across rounds; `failed` holds the last failure per id
    pub outcome: BatchOutcome,
    /// Members removed across all rounds
    pub removed: Vec<TeamMember>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        self.outcome.summary(self.kind)
    }

    pub fn has_failures(&self) -> bool {
        !self.outcome.failed.is_empty()
    }
}

/// Run the batch for `action` over the current selection of its kind
///
/// `retries` extra rounds re-dispatch only the failed ids whose reason is
/// retryable; permanent failures (4xx, missing member) are sent once.
pub async fn run_batch(
    manager: &RosterManager,
    coordinator: &BulkCoordinator,
    operation: &dyn RemoteOperation,
    action: BatchAction,
    retries: u32,
) -> StateResponse<BatchReport> {
    let kind = action.kind();
    debug!(%kind, retries, "run_batch: called");

    let mut report = BatchReport {
        kind,
        rounds: 0,
        outcome: BatchOutcome::empty(),
        removed: Vec::new(),
    };

    let mut ids = manager.selection(kind).await?;
    while !ids.is_empty() {
        let outcome = coordinator.execute(&ids, operation, action.payload()).await;
        let reconciled: ReconcileReport = manager.reconcile(outcome.clone(), action.clone()).await?;
        coordinator.mark_reconciled();

        report.rounds += 1;
        report.removed.extend(reconciled.removed);
        report.outcome.absorb_retry(outcome);

        if !report.has_failures() || report.rounds > retries {
            break;
        }

        // failed ids stay selected; only retry those still selected
        let selected = manager.selection(kind).await?;
        ids = report
            .outcome
            .retryable_ids()
            .into_iter()
            .filter(|id| selected.contains(id))
            .collect();
        if ids.is_empty() {
            debug!(%kind, round = report.rounds, "run_batch: no retryable failures left");
        } else {
            info!(%kind, round = report.rounds, retrying = ids.len(), "run_batch: retrying failed ids");
        }
    }

    if report.rounds == 0 {
        debug!(%kind, "run_batch: selection empty");
    }
    info!(%kind, rounds = report.rounds, status = %report.outcome.status(), "run_batch: finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiOperation;
    use crate::api::client::mock::MockRosterApi;
    use crate::batch::{BatchPhase, FailureReason, OperationResult};
    use crate::domain::{MemberId, UpdatePayload};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Fails each id a fixed number of times before succeeding
    struct Flaky {
        remaining_failures: Mutex<HashMap<MemberId, u32>>,
    }

    impl Flaky {
        fn new(plan: &[(i64, u32)]) -> Self {
            Self {
                remaining_failures: Mutex::new(plan.iter().map(|(id, n)| (MemberId::from(*id), *n)).collect()),
            }
        }
    }

    #[async_trait]
    impl RemoteOperation for Flaky {
        async fn perform(&self, id: &MemberId, _payload: Option<&UpdatePayload>) -> OperationResult {
            let mut plan = self.remaining_failures.lock().unwrap();
            match plan.get_mut(id) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Err(FailureReason::new("flaky"))
                }
                _ => Ok(None),
            }
        }
    }

    fn member(id: i64) -> TeamMember {
        TeamMember {
            id: MemberId::from(id),
            name: format!("Member {}", id),
            role: "Engineer".to_string(),
            bio: "Bio".to_string(),
            photo: None,
        }
    }

    async fn selected(kind: BatchKind, ids: &[i64]) -> RosterManager {
        let manager = RosterManager::spawn();
        manager.load((1..=5).map(member).collect()).await.unwrap();
        for id in ids {
            manager.toggle(kind, MemberId::from(*id), true).await.unwrap();
        }
        manager
    }

    #[tokio::test]
    async fn test_empty_selection_runs_no_rounds() {
        let manager = selected(BatchKind::Delete, &[]).await;
        let coordinator = BulkCoordinator::new();

        let report = run_batch(&manager, &coordinator, &Flaky::new(&[]), BatchAction::Delete, 3)
            .await
            .unwrap();

        assert_eq!(report.rounds, 0);
        assert!(report.outcome.is_noop());
        assert_eq!(coordinator.phase(), BatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_without_retries_failures_stay_selected() {
        let manager = selected(BatchKind::Delete, &[1, 2, 3]).await;
        let coordinator = BulkCoordinator::new();

        let report = run_batch(&manager, &coordinator, &Flaky::new(&[(2, 1)]), BatchAction::Delete, 0)
            .await
            .unwrap();

        assert_eq!(report.rounds, 1);
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.summary(), "2 of 3 deleted; 1 failed: 2: flaky");
        let still = manager.selection(BatchKind::Delete).await.unwrap();
        assert_eq!(still.into_iter().collect::<Vec<_>>(), vec![MemberId::from(2)]);
        assert_eq!(coordinator.phase(), BatchPhase::Reconciled);
    }

    /// Rejects some ids with a reason that a retry cannot fix
    struct Refusing {
        refused: Vec<MemberId>,
        calls: Mutex<HashMap<MemberId, u32>>,
    }

    #[async_trait]
    impl RemoteOperation for Refusing {
        async fn perform(&self, id: &MemberId, _payload: Option<&UpdatePayload>) -> OperationResult {
            *self.calls.lock().unwrap().entry(id.clone()).or_default() += 1;
            if self.refused.contains(id) {
                Err(FailureReason::permanent("API error 400: Bad request"))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_resent() {
        let manager = selected(BatchKind::Delete, &[1, 2]).await;
        let coordinator = BulkCoordinator::new();
        let op = Refusing {
            refused: vec![MemberId::from(2)],
            calls: Mutex::new(HashMap::new()),
        };

        let report = run_batch(&manager, &coordinator, &op, BatchAction::Delete, 3)
            .await
            .unwrap();

        assert_eq!(report.rounds, 1);
        assert_eq!(op.calls.lock().unwrap()[&MemberId::from(2)], 1);
        assert_eq!(report.outcome.failed_ids().into_iter().collect::<Vec<_>>(), vec![MemberId::from(2)]);
        // still ticked so the user can decide what to do with it
        assert!(manager.selection(BatchKind::Delete).await.unwrap().contains(&MemberId::from(2)));
    }

    #[tokio::test]
    async fn test_not_found_from_backend_is_not_resent() {
        // the roster still lists 3, but the backend no longer has it; 2 hits a 500
        let manager = selected(BatchKind::Delete, &[1, 2, 3]).await;
        let coordinator = BulkCoordinator::new();
        let api = Arc::new(MockRosterApi::new(vec![member(1), member(2)]).rejecting(&[2]));
        let op = ApiOperation::delete(api.clone());

        let report = run_batch(&manager, &coordinator, &op, BatchAction::Delete, 2)
            .await
            .unwrap();

        // round 1: 1, 2, 3; rounds 2 and 3: only the 500 on 2
        assert_eq!(report.rounds, 3);
        assert_eq!(api.call_count(), 5);
        assert_eq!(
            report.outcome.failed_ids().into_iter().collect::<Vec<_>>(),
            vec![MemberId::from(2), MemberId::from(3)]
        );
        assert_eq!(
            report.outcome.failed[&MemberId::from(3)].message,
            "API error 404: Member 3 not found"
        );
    }

    #[tokio::test]
    async fn test_retries_only_failed_ids() {
        let manager = selected(BatchKind::Delete, &[1, 2, 3]).await;
        let coordinator = BulkCoordinator::new();

        let report = run_batch(
            &manager,
            &coordinator,
            &Flaky::new(&[(2, 1), (3, 5)]),
            BatchAction::Delete,
            2,
        )
        .await
        .unwrap();

        assert_eq!(report.rounds, 3);
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.outcome.failed_ids().into_iter().collect::<Vec<_>>(), vec![MemberId::from(3)]);
        assert_eq!(report.outcome.total(), 3);
        assert_eq!(manager.list_members().await.unwrap().len(), 3);
    }
}
