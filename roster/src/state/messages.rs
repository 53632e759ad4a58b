//! Roster state messages
//!
//! Commands and responses for the actor pattern.

use std::collections::BTreeSet;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::batch::{BatchAction, BatchKind, BatchOutcome, ReconcileReport};
use crate::domain::{MemberId, TeamMember};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Member not found: {0}")]
    NotFound(MemberId),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the RosterManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Collection operations
    Load {
        members: Vec<TeamMember>,
        reply: oneshot::Sender<StateResponse<usize>>,
    },
    ListMembers {
        reply: oneshot::Sender<StateResponse<Vec<TeamMember>>>,
    },
    GetMember {
        id: MemberId,
        reply: oneshot::Sender<StateResponse<Option<TeamMember>>>,
    },

    // Selection operations
    Toggle {
        kind: BatchKind,
        id: MemberId,
        selected: bool,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    Selection {
        kind: BatchKind,
        reply: oneshot::Sender<StateResponse<BTreeSet<MemberId>>>,
    },
    ClearSelection {
        kind: BatchKind,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Batch results
    Reconcile {
        outcome: BatchOutcome,
        action: BatchAction,
        reply: oneshot::Sender<StateResponse<ReconcileReport>>,
    },

    // Shutdown
    Shutdown,
}
