//! Shell session management

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::api::{ApiOperation, RosterApi};
use crate::batch::{BatchAction, BatchKind, BulkCoordinator};
use crate::cli::OutputFormat;
use crate::output;
use crate::state::{RosterManager, StateError};
use crate::workflow::{BatchReport, run_batch};

use super::command::{ShellCommand, parse_command};

/// Interactive shell session
pub struct ShellSession {
    api: Arc<dyn RosterApi>,
    manager: RosterManager,
    coordinator: BulkCoordinator,
    retries: u32,
}

/// Whether the loop keeps reading after a command
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

impl ShellSession {
    pub fn new(api: Arc<dyn RosterApi>, manager: RosterManager, coordinator: BulkCoordinator, retries: u32) -> Self {
        Self {
            api,
            manager,
            coordinator,
            retries,
        }
    }

    /// Run the shell main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        if let Err(e) = self.refresh().await {
            println!("{} {:#}", "✗".red(), e);
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "roster>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    match parse_command(input) {
                        Ok(cmd) => match self.handle(cmd).await {
                            Ok(Flow::Continue) => continue,
                            Ok(Flow::Quit) => break,
                            Err(e) => println!("{} {:#}", "✗".red(), e),
                        },
                        Err(msg) => {
                            println!("{} {}", "?".yellow(), msg);
                            println!("Type {} for available commands", "help".yellow());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    pub(crate) async fn handle(&mut self, cmd: ShellCommand) -> Result<Flow> {
        debug!(?cmd, "handle: called");
        match cmd {
            ShellCommand::Select { kind, ids } => {
                for id in ids {
                    match self.manager.toggle(kind, id.clone(), true).await {
                        Ok(()) => {}
                        Err(StateError::NotFound(_)) => {
                            println!("{} No team member with id {}", "!".yellow(), id);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                self.print_selection_count(kind).await?;
            }
            ShellCommand::Unselect { kind, ids } => {
                for id in ids {
                    self.manager.toggle(kind, id, false).await?;
                }
                self.print_selection_count(kind).await?;
            }
            ShellCommand::Clear(kind) => {
                self.manager.clear_selection(kind).await?;
                self.print_selection_count(kind).await?;
            }
            ShellCommand::Selected => {
                for kind in [BatchKind::Delete, BatchKind::Update] {
                    let ids = self.manager.selection(kind).await?;
                    let list: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                    println!("  {:8} {}", kind.to_string().yellow(), list.join(", "));
                }
            }
            ShellCommand::List(kind) => self.print_list(kind).await?,
            ShellCommand::Refresh => self.refresh().await?,
            ShellCommand::Delete => {
                let report = self.batch(BatchAction::Delete).await?;
                println!("{}", output::render_report(&report, &OutputFormat::Text)?);
            }
            ShellCommand::Update(payload) => {
                let report = self.batch(BatchAction::Update(payload)).await?;
                println!("{}", output::render_report(&report, &OutputFormat::Text)?);
            }
            ShellCommand::Help => self.print_help(),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn refresh(&self) -> Result<()> {
        let members = self.api.list_members().await?;
        let count = self.manager.load(members).await?;
        println!("{}", format!("Loaded {} team members", count).dimmed());
        Ok(())
    }

    async fn batch(&self, action: BatchAction) -> Result<BatchReport> {
        let kind = action.kind();
        let selected = self.manager.selection(kind).await?;
        if !selected.is_empty() {
            println!("{}", format!("Running {} on {} members...", kind, selected.len()).dimmed());
        }

        let operation = ApiOperation::new(self.api.clone(), kind);
        let report = run_batch(&self.manager, &self.coordinator, &operation, action, self.retries).await?;
        if report.has_failures() {
            warn!(%kind, failed = report.outcome.failed.len(), "batch: failures left selected");
        }
        Ok(report)
    }

    async fn print_list(&self, kind: BatchKind) -> Result<()> {
        let members = self.manager.list_members().await?;
        let selected = self.manager.selection(kind).await?;
        println!("{}", output::render_members(&members, &selected, &OutputFormat::Text)?);
        Ok(())
    }

    async fn print_selection_count(&self, kind: BatchKind) -> Result<()> {
        let count = self.manager.selection(kind).await?.len();
        println!("{}", format!("{} selected for {}", count, kind).dimmed());
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Roster Shell".bright_cyan().bold());
        println!("Type {} for help, {} to quit", "help".yellow(), "quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:34} Tick ids for a batch action", "select <delete|update> <id>...".yellow());
        println!("  {:34} Untick ids", "unselect <delete|update> <id>...".yellow());
        println!("  {:34} Untick everything", "clear <delete|update>".yellow());
        println!("  {:34} Show both selections", "selected".yellow());
        println!("  {:34} Show the roster with checkboxes", "list [delete|update]".yellow());
        println!("  {:34} Reload the roster from the server", "refresh".yellow());
        println!("  {:34} Delete every ticked member", "delete".yellow());
        println!("  {:34} Change fields on every ticked member", "update field=value...".yellow());
        println!("  {:34} Show this help", "help".yellow());
        println!("  {:34} Exit the shell", "quit".yellow());
        println!();
    }
}
