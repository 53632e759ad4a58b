//! RosterManager - actor that owns the member collection and selections
//!
//! Every mutation of the collection or of a selection is a message to one
//! task, so concurrent callers never race on either.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::batch::{BatchAction, BatchKind, BatchOutcome, ReconcileReport, Reconciler};
use crate::domain::{MemberCollection, MemberId, TeamMember};
use crate::selection::SelectionTracker;

use super::messages::{StateCommand, StateError, StateResponse};

/// Event broadcast when state changes that a front end should re-render for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// The collection was replaced wholesale
    MembersLoaded { count: usize },
    /// A selection changed size
    SelectionChanged { kind: BatchKind, selected: usize },
    /// A batch outcome was applied
    Reconciled {
        kind: BatchKind,
        succeeded: usize,
        failed: usize,
    },
}

/// Handle to send commands to the RosterManager
#[derive(Clone)]
pub struct RosterManager {
    tx: mpsc::Sender<StateCommand>,
    event_tx: broadcast::Sender<StateEvent>,
}

impl RosterManager {
    /// Spawn a new RosterManager actor with an empty collection
    pub fn spawn() -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);

        tokio::spawn(actor_loop(RosterState::default(), rx, event_tx.clone()));

        info!("RosterManager spawned");
        Self { tx, event_tx }
    }

    /// Subscribe to state change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Collection operations ===

    /// Replace the collection, purging selected ids that disappeared
    pub async fn load(&self, members: Vec<TeamMember>) -> StateResponse<usize> {
        debug!(count = members.len(), "load: called");
        self.request(|reply| StateCommand::Load { members, reply }).await
    }

    pub async fn list_members(&self) -> StateResponse<Vec<TeamMember>> {
        debug!("list_members: called");
        self.request(|reply| StateCommand::ListMembers { reply }).await
    }

    pub async fn get_member(&self, id: &MemberId) -> StateResponse<Option<TeamMember>> {
        debug!(%id, "get_member: called");
        let id = id.clone();
        self.request(|reply| StateCommand::GetMember { id, reply }).await
    }

    /// Get a member by ID, returning error if not found
    pub async fn get_member_required(&self, id: &MemberId) -> StateResponse<TeamMember> {
        self.get_member(id)
            .await?
            .ok_or_else(|| StateError::NotFound(id.clone()))
    }

    // === Selection operations ===

    /// Tick or untick one id; selecting an id that is not in the collection fails
    pub async fn toggle(&self, kind: BatchKind, id: MemberId, selected: bool) -> StateResponse<()> {
        debug!(%kind, %id, selected, "toggle: called");
        self.request(|reply| StateCommand::Toggle {
            kind,
            id,
            selected,
            reply,
        })
        .await
    }

    pub async fn selection(&self, kind: BatchKind) -> StateResponse<BTreeSet<MemberId>> {
        debug!(%kind, "selection: called");
        self.request(|reply| StateCommand::Selection { kind, reply }).await
    }

    pub async fn clear_selection(&self, kind: BatchKind) -> StateResponse<()> {
        debug!(%kind, "clear_selection: called");
        self.request(|reply| StateCommand::ClearSelection { kind, reply }).await
    }

    // === Batch results ===

    /// Apply a batch outcome to the collection and the matching selection
    pub async fn reconcile(&self, outcome: BatchOutcome, action: BatchAction) -> StateResponse<ReconcileReport> {
        debug!(kind = %action.kind(), status = %outcome.status(), "reconcile: called");
        self.request(|reply| StateCommand::Reconcile { outcome, action, reply })
            .await
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// State owned by the actor task
#[derive(Debug, Default)]
struct RosterState {
    collection: MemberCollection,
    selections: BTreeMap<BatchKind, SelectionTracker>,
}

impl RosterState {
    fn tracker(&mut self, kind: BatchKind) -> &mut SelectionTracker {
        self.selections.entry(kind).or_default()
    }

    fn selected_count(&self, kind: BatchKind) -> usize {
        self.selections.get(&kind).map(|t| t.len()).unwrap_or(0)
    }

    /// Keep every selection a subset of the collection
    fn purge_selections(&mut self) {
        let collection = &self.collection;
        for tracker in self.selections.values_mut() {
            tracker.retain(|id| collection.contains(id));
        }
    }

    fn toggle(&mut self, kind: BatchKind, id: MemberId, selected: bool) -> StateResponse<()> {
        if selected && !self.collection.contains(&id) {
            debug!(%kind, %id, "toggle: id not in collection");
            return Err(StateError::NotFound(id));
        }
        self.tracker(kind).toggle(id, selected);
        Ok(())
    }

    fn reconcile(&mut self, outcome: &BatchOutcome, action: &BatchAction) -> ReconcileReport {
        let kind = action.kind();
        let mut tracker = self.selections.remove(&kind).unwrap_or_default();
        let report = Reconciler::reconcile(outcome, action, &mut self.collection, &mut tracker);
        self.selections.insert(kind, tracker);

        if !report.removed.is_empty() {
            self.purge_selections();
        }
        report
    }
}

/// Main actor loop - processes commands sequentially
async fn actor_loop(
    mut state: RosterState,
    mut rx: mpsc::Receiver<StateCommand>,
    event_tx: broadcast::Sender<StateEvent>,
) {
    info!("RosterManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Load { members, reply } => {
                debug!(count = members.len(), "actor_loop: Load");
                state.collection = MemberCollection::new(members);
                state.purge_selections();
                let count = state.collection.len();
                let _ = event_tx.send(StateEvent::MembersLoaded { count });
                let _ = reply.send(Ok(count));
            }
            StateCommand::ListMembers { reply } => {
                let _ = reply.send(Ok(state.collection.members().to_vec()));
            }
            StateCommand::GetMember { id, reply } => {
                let _ = reply.send(Ok(state.collection.get(&id).cloned()));
            }
            StateCommand::Toggle {
                kind,
                id,
                selected,
                reply,
            } => {
                let result = state.toggle(kind, id, selected);
                if result.is_ok() {
                    let _ = event_tx.send(StateEvent::SelectionChanged {
                        kind,
                        selected: state.selected_count(kind),
                    });
                }
                let _ = reply.send(result);
            }
            StateCommand::Selection { kind, reply } => {
                let selected = state.selections.get(&kind).map(|t| t.current().clone()).unwrap_or_default();
                let _ = reply.send(Ok(selected));
            }
            StateCommand::ClearSelection { kind, reply } => {
                state.tracker(kind).clear();
                let _ = event_tx.send(StateEvent::SelectionChanged { kind, selected: 0 });
                let _ = reply.send(Ok(()));
            }
            StateCommand::Reconcile { outcome, action, reply } => {
                let report = state.reconcile(&outcome, &action);
                let _ = event_tx.send(StateEvent::Reconciled {
                    kind: action.kind(),
                    succeeded: outcome.succeeded.len(),
                    failed: outcome.failed.len(),
                });
                let _ = reply.send(Ok(report));
            }
            StateCommand::Shutdown => {
                info!("RosterManager shutting down");
                break;
            }
        }
    }

    info!("RosterManager actor stopped");
}
