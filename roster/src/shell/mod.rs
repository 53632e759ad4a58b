//! Interactive roster shell
//!
//! A line-oriented stand-in for the checkbox list view: tick ids into the
//! delete or update selection, then fire the batch action.

mod command;
mod session;

pub use command::{ShellCommand, parse_assignments, parse_command};
pub use session::ShellSession;

use std::sync::Arc;

use eyre::Result;

use crate::api::RosterApi;
use crate::batch::BulkCoordinator;
use crate::config::Config;
use crate::state::RosterManager;

/// Run the interactive shell
///
/// This is the main entry point for `roster shell`.
pub async fn run_interactive(config: &Config, api: Arc<dyn RosterApi>) -> Result<()> {
    let manager = RosterManager::spawn();
    let coordinator = BulkCoordinator::from_config(&config.batch);

    let mut session = ShellSession::new(api, manager.clone(), coordinator, config.batch.retries);
    let result = session.run().await;

    manager.shutdown().await?;
    result
}
