//! Roster - team member administration with bulk actions
//!
//! Roster manages a collection of team member profiles held on a remote
//! server. Members are ticked into a selection, and one click fires a batch
//! delete or update against every ticked id at once.
//!
//! # Core Concepts
//!
//! - **Per-id isolation**: one remote operation per id, run concurrently; one
//!   failure never hides another's success
//! - **Complete outcomes**: every dispatched id ends up succeeded or failed,
//!   never both, never neither
//! - **Pessimistic reconciliation**: the local roster changes only for ids the
//!   server confirmed; failed ids stay selected for a retry
//!
//! # Modules
//!
//! - [`batch`] - Coordinator, outcome aggregation and reconciliation
//! - [`selection`] - Checkbox-style selection tracking
//! - [`state`] - Actor owning the roster and its selections
//! - [`api`] - Remote backend trait and HTTP implementation
//! - [`workflow`] - One user-triggered batch, end to end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`shell`] - Interactive shell

pub mod api;
pub mod batch;
pub mod cli;
pub mod config;
pub mod domain;
pub mod output;
pub mod selection;
pub mod shell;
pub mod state;
pub mod workflow;

// Re-export commonly used types
pub use api::{ApiError, ApiOperation, RestApi, RosterApi, create_client};
pub use batch::{
    BatchAction, BatchKind, BatchOutcome, BatchPhase, BatchStatus, BulkCoordinator, FailureReason, OperationResult,
    ReconcileReport, Reconciler, RemoteOperation,
};
pub use config::{ApiConfig, BatchConfig, Config};
pub use domain::{MemberCollection, MemberId, NewMember, TeamMember, UpdatePayload, ValidationError};
pub use selection::SelectionTracker;
pub use state::{RosterManager, StateCommand, StateError, StateEvent, StateResponse};
pub use workflow::{BatchReport, run_batch};
