//! Roster - team member administration
//!
//! CLI entry point for listing, editing and bulk-changing team members.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use roster::api::{ApiOperation, RosterApi, create_client};
use roster::batch::{BatchAction, BulkCoordinator};
use roster::cli::{Cli, Command, OutputFormat, get_log_path};
use roster::config::Config;
use roster::domain::{MemberId, NewMember, UpdatePayload};
use roster::output;
use roster::shell;
use roster::state::{RosterManager, StateError};
use roster::workflow::run_batch;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;
    info!(base_url = %config.api.base_url, "roster loaded config");

    let api = create_client(&config.api).context("Failed to create API client")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::List) => cmd_list(api.as_ref(), &cli.format).await,
        Some(Command::Show { id }) => cmd_show(api.as_ref(), &id, &cli.format).await,
        Some(Command::Add { fields }) => cmd_add(api.as_ref(), fields.into(), &cli.format).await,
        Some(Command::Edit { id, fields }) => cmd_edit(api.as_ref(), &id, fields.into(), &cli.format).await,
        Some(Command::Delete { ids, retries }) => {
            let retries = retries.unwrap_or(config.batch.retries);
            cmd_batch(&config, api, BatchAction::Delete, ids, retries, &cli.format).await
        }
        Some(Command::Update { ids, fields, retries }) => {
            let payload = UpdatePayload::from(fields);
            payload.validate()?;
            let retries = retries.unwrap_or(config.batch.retries);
            cmd_batch(&config, api, BatchAction::Update(payload), ids, retries, &cli.format).await
        }
        Some(Command::Shell) => shell::run_interactive(&config, api).await,
    }
}

async fn cmd_list(api: &dyn RosterApi, format: &OutputFormat) -> Result<()> {
    let members = api.list_members().await.context("Failed to list team members")?;
    println!("{}", output::render_members(&members, &Default::default(), format)?);
    Ok(())
}

async fn cmd_show(api: &dyn RosterApi, id: &MemberId, format: &OutputFormat) -> Result<()> {
    let member = api
        .get_member(id)
        .await
        .context(format!("Failed to fetch team member {}", id))?;
    println!("{}", output::render_member(&member, format)?);
    Ok(())
}

async fn cmd_add(api: &dyn RosterApi, new: NewMember, format: &OutputFormat) -> Result<()> {
    new.validate()?;
    let member = api.add_member(&new).await.context("Failed to add team member")?;
    info!(id = %member.id, "cmd_add: member added");
    println!("{} Added team member {}", "✓".green(), member.id.to_string().cyan());
    println!("{}", output::render_member(&member, format)?);
    Ok(())
}

async fn cmd_edit(api: &dyn RosterApi, id: &MemberId, fields: NewMember, format: &OutputFormat) -> Result<()> {
    fields.validate()?;
    let echoed = api
        .update_member(id, &fields.into_payload())
        .await
        .context(format!("Failed to update team member {}", id))?;
    let member = match echoed {
        Some(member) => member,
        None => api
            .get_member(id)
            .await
            .context(format!("Failed to fetch team member {}", id))?,
    };
    println!("{} Updated team member {}", "✓".green(), member.id.to_string().cyan());
    println!("{}", output::render_member(&member, format)?);
    Ok(())
}

async fn cmd_batch(
    config: &Config,
    api: Arc<dyn RosterApi>,
    action: BatchAction,
    ids: Vec<MemberId>,
    retries: u32,
    format: &OutputFormat,
) -> Result<()> {
    let kind = action.kind();
    debug!(%kind, count = ids.len(), retries, "cmd_batch: called");

    let manager = RosterManager::spawn();
    let members = api.list_members().await.context("Failed to list team members")?;
    manager.load(members).await?;

    for id in ids {
        match manager.toggle(kind, id.clone(), true).await {
            Ok(()) => {}
            Err(StateError::NotFound(_)) => {
                warn!(%id, "cmd_batch: unknown id skipped");
                eprintln!("{} No team member with id {}, skipping", "!".yellow(), id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let coordinator = BulkCoordinator::from_config(&config.batch);
    let operation = ApiOperation::new(api, kind);
    let report = run_batch(&manager, &coordinator, &operation, action, retries).await?;
    manager.shutdown().await?;

    println!("{}", output::render_report(&report, format)?);

    if report.has_failures() {
        return Err(eyre::eyre!(
            "{} of {} could not be {}",
            report.outcome.failed.len(),
            report.outcome.total(),
            kind.past_tense()
        ));
    }
    Ok(())
}
