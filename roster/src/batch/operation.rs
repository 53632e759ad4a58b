//! RemoteOperation trait definition

use async_trait::async_trait;

use super::FailureReason;
use crate::domain::{MemberId, TeamMember, UpdatePayload};

/// Result of one remote mutation
///
/// `Some` carries the record when the backend echoes it back; deletes often
/// acknowledge with an empty body.
pub type OperationResult = Result<Option<TeamMember>, FailureReason>;

/// One remote mutation for one id
///
/// This is the only seam between the batch core and the transport. An
/// implementation must resolve every call to either a success or a failure;
/// network errors, bad statuses and unreadable responses all map to
/// [`FailureReason`].
#[async_trait]
pub trait RemoteOperation: Send + Sync {
    async fn perform(&self, id: &MemberId, payload: Option<&UpdatePayload>) -> OperationResult;
}
