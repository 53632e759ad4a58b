//! BulkCoordinator - fan out one remote operation per selected id

use std::collections::BTreeSet;
use std::pin::pin;
use std::task::Poll;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BatchOutcome, BatchPhase, FailureReason, RemoteOperation};
use crate::config::BatchConfig;
use crate::domain::{MemberId, UpdatePayload};

/// Runs batches and publishes their phase
///
/// All operations of a batch are driven from the calling task and joined at a
/// single point; nothing is throttled, queued or cancelled. An optional
/// per-operation timeout turns a hung call into a failure for that id only.
pub struct BulkCoordinator {
    op_timeout: Option<Duration>,
    phase_tx: watch::Sender<BatchPhase>,
}

impl BulkCoordinator {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(BatchPhase::Idle);
        Self {
            op_timeout: None,
            phase_tx,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        debug!(?config, "BulkCoordinator::from_config: called");
        Self::new().with_op_timeout(config.op_timeout())
    }

    pub fn with_op_timeout(mut self, op_timeout: Option<Duration>) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Watch the phase of the current batch
    pub fn subscribe(&self) -> watch::Receiver<BatchPhase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> BatchPhase {
        *self.phase_tx.borrow()
    }

    /// Close the current batch once its outcome has been applied
    pub fn mark_reconciled(&self) {
        debug!("BulkCoordinator::mark_reconciled: called");
        self.phase_tx.send_replace(BatchPhase::Reconciled);
    }

    /// Run `operation` once per id and wait for every call to settle
    ///
    /// An empty `ids` dispatches nothing and returns the empty outcome. The
    /// returned outcome always accounts for exactly `ids`.
    pub async fn execute(
        &self,
        ids: &BTreeSet<MemberId>,
        operation: &dyn RemoteOperation,
        payload: Option<&UpdatePayload>,
    ) -> BatchOutcome {
        if ids.is_empty() {
            debug!("execute: empty selection, nothing to dispatch");
            return BatchOutcome::empty();
        }

        let batch_id = Uuid::now_v7();
        info!(%batch_id, count = ids.len(), has_payload = payload.is_some(), "execute: dispatching batch");

        self.phase_tx.send_replace(BatchPhase::Dispatching);
        let pending: Vec<_> = ids
            .iter()
            .map(|id| self.settle_one(batch_id, id.clone(), operation, payload))
            .collect();

        // the first poll starts every operation; after it they are all in flight
        let mut joined = pin!(join_all(pending));
        let first = futures::poll!(joined.as_mut());
        self.phase_tx.send_replace(BatchPhase::Settling);
        let settled = match first {
            Poll::Ready(settled) => settled,
            Poll::Pending => joined.await,
        };
        let outcome = BatchOutcome::from_settled(settled);

        assert!(
            outcome.covers(ids),
            "batch {} lost track of ids: requested {}, settled {}",
            batch_id,
            ids.len(),
            outcome.total()
        );

        info!(
            %batch_id,
            status = %outcome.status(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "execute: batch settled"
        );
        outcome
    }

    async fn settle_one(
        &self,
        batch_id: Uuid,
        id: MemberId,
        operation: &dyn RemoteOperation,
        payload: Option<&UpdatePayload>,
    ) -> (MemberId, Result<(), FailureReason>) {
        debug!(%batch_id, %id, "settle_one: called");
        let attempt = operation.perform(&id, payload);

        let result = match self.op_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(FailureReason::new(format!("timed out after {}ms", limit.as_millis()))),
            },
            None => attempt.await,
        };

        match result {
            Ok(echo) => {
                debug!(%batch_id, %id, echoed = echo.is_some(), "settle_one: succeeded");
                (id, Ok(()))
            }
            Err(reason) => {
                warn!(%batch_id, %id, %reason, "settle_one: failed");
                (id, Err(reason))
            }
        }
    }
}

impl Default for BulkCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
