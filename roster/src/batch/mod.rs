//! Bulk mutation coordination
//!
//! A batch takes the ids currently selected for one action, runs one remote
//! operation per id concurrently, and folds the settled results into a
//! [`BatchOutcome`] that the [`Reconciler`] applies to the in-memory roster.
//!
//! Per batch the coordinator moves through
//! `Idle -> Dispatching -> Settling -> Reconciled`; a new batch may start
//! right after, even if failed ids are still selected. `Dispatching` covers
//! starting the operations, `Settling` runs from the point all of them are in
//! flight until the last one resolves.

mod coordinator;
mod operation;
mod outcome;
mod reconciler;

pub use coordinator::BulkCoordinator;
pub use operation::{OperationResult, RemoteOperation};
pub use outcome::{BatchOutcome, BatchStatus, FailureReason};
pub use reconciler::{ReconcileReport, Reconciler};

use std::fmt;

use serde::Serialize;

use crate::domain::UpdatePayload;

/// Which batch action a selection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Delete,
    Update,
}

impl BatchKind {
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Update => "updated",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Update => write!(f, "update"),
        }
    }
}

impl std::str::FromStr for BatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delete" | "del" => Ok(Self::Delete),
            "update" | "edit" => Ok(Self::Update),
            _ => Err(format!("Unknown batch kind: {}. Use: delete or update", s)),
        }
    }
}

/// A batch action together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchAction {
    Delete,
    Update(UpdatePayload),
}

impl BatchAction {
    pub fn kind(&self) -> BatchKind {
        match self {
            Self::Delete => BatchKind::Delete,
            Self::Update(_) => BatchKind::Update,
        }
    }

    pub fn payload(&self) -> Option<&UpdatePayload> {
        match self {
            Self::Delete => None,
            Self::Update(payload) => Some(payload),
        }
    }
}

/// Lifecycle of a single batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPhase {
    #[default]
    Idle,
    Dispatching,
    Settling,
    Reconciled,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Settling => write!(f, "settling"),
            Self::Reconciled => write!(f, "reconciled"),
        }
    }
}
