//! Roster state with actor pattern
//!
//! RosterManager owns the member collection and the per-action selections and
//! processes messages via channels, serializing every mutation.

mod manager;
mod messages;

pub use manager::{RosterManager, StateEvent};
pub use messages::{StateCommand, StateError, StateResponse};
