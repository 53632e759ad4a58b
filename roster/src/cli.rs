//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{MemberId, NewMember, UpdatePayload};

/// Roster - team member administration
#[derive(Parser)]
#[command(
    name = "roster",
    about = "List, add, edit and bulk-change team member profiles",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all team members
    List,

    /// Show one team member
    Show {
        /// Member ID
        id: MemberId,
    },

    /// Add a team member
    Add {
        #[command(flatten)]
        fields: MemberFields,
    },

    /// Edit every field of one team member
    Edit {
        /// Member ID
        id: MemberId,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// Delete several team members at once
    Delete {
        /// Member IDs to delete
        #[arg(required = true, value_name = "ID")]
        ids: Vec<MemberId>,

        /// Extra rounds that retry only the failed IDs
        #[arg(short, long)]
        retries: Option<u32>,
    },

    /// Apply the same field changes to several team members at once
    Update {
        /// Member IDs to update
        #[arg(required = true, value_name = "ID")]
        ids: Vec<MemberId>,

        #[command(flatten)]
        fields: PayloadFields,

        /// Extra rounds that retry only the failed IDs
        #[arg(short, long)]
        retries: Option<u32>,
    },

    /// Interactive session with checkbox-style selection
    Shell,
}

/// Full field set for add and edit
#[derive(Debug, Clone, Args)]
pub struct MemberFields {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Job title or role
    #[arg(long)]
    pub role: String,

    /// Short biography
    #[arg(long)]
    pub bio: String,

    /// Photo URL or data URI
    #[arg(long)]
    pub photo: Option<String>,
}

impl From<MemberFields> for NewMember {
    fn from(fields: MemberFields) -> Self {
        Self {
            name: fields.name,
            role: fields.role,
            bio: fields.bio,
            photo: fields.photo,
        }
    }
}

/// Optional field set for bulk update; only given fields are changed
#[derive(Debug, Clone, Default, Args)]
pub struct PayloadFields {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New role
    #[arg(long)]
    pub role: Option<String>,

    /// New biography
    #[arg(long)]
    pub bio: Option<String>,

    /// New photo URL or data URI
    #[arg(long)]
    pub photo: Option<String>,
}

impl From<PayloadFields> for UpdatePayload {
    fn from(fields: PayloadFields) -> Self {
        Self {
            name: fields.name,
            role: fields.role,
            bio: fields.bio,
            photo: fields.photo,
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster")
        .join("logs")
        .join("roster.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Output format for listings and reports
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text, json, or table", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Table => write!(f, "table"),
        }
    }
}
