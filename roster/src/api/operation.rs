//! Adapts a [`RosterApi`] into the per-id operation a batch dispatches

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::RosterApi;
use crate::batch::{BatchKind, FailureReason, OperationResult, RemoteOperation};
use crate::domain::{MemberId, UpdatePayload};

pub struct ApiOperation {
    api: Arc<dyn RosterApi>,
    kind: BatchKind,
}

impl ApiOperation {
    pub fn new(api: Arc<dyn RosterApi>, kind: BatchKind) -> Self {
        Self { api, kind }
    }

    pub fn delete(api: Arc<dyn RosterApi>) -> Self {
        Self::new(api, BatchKind::Delete)
    }

    pub fn update(api: Arc<dyn RosterApi>) -> Self {
        Self::new(api, BatchKind::Update)
    }
}

#[async_trait]
impl RemoteOperation for ApiOperation {
    async fn perform(&self, id: &MemberId, payload: Option<&UpdatePayload>) -> OperationResult {
        debug!(kind = %self.kind, %id, "ApiOperation::perform: called");
        match self.kind {
            BatchKind::Delete => self.api.delete_member(id).await.map_err(FailureReason::from),
            BatchKind::Update => {
                let payload = payload.ok_or_else(|| FailureReason::permanent("update requested without a payload"))?;
                self.api.update_member(id, payload).await.map_err(FailureReason::from)
            }
        }
    }
}
