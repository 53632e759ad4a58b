//! RosterApi trait definition

use async_trait::async_trait;

use super::ApiError;
use crate::domain::{MemberId, NewMember, TeamMember, UpdatePayload};

/// Remote roster backend
///
/// Every call is independent; implementations hold no per-batch state and
/// may be shared across concurrent operations.
#[async_trait]
pub trait RosterApi: Send + Sync {
    /// Fetch every member
    async fn list_members(&self) -> Result<Vec<TeamMember>, ApiError>;

    /// Fetch one member
    async fn get_member(&self, id: &MemberId) -> Result<TeamMember, ApiError>;

    /// Create a member and return the stored record
    async fn add_member(&self, member: &NewMember) -> Result<TeamMember, ApiError>;

    /// Overwrite the fields present in `payload`; `Some` when the backend echoes the stored record
    async fn update_member(&self, id: &MemberId, payload: &UpdatePayload) -> Result<Option<TeamMember>, ApiError>;

    /// Delete a member; `Some` when the backend echoes the deleted record
    async fn delete_member(&self, id: &MemberId) -> Result<Option<TeamMember>, ApiError>;
}
