//! Shell command parsing

use crate::batch::BatchKind;
use crate::domain::{MemberId, UpdatePayload};

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Tick ids into a selection
    Select { kind: BatchKind, ids: Vec<MemberId> },
    /// Untick ids from a selection
    Unselect { kind: BatchKind, ids: Vec<MemberId> },
    /// Empty a selection
    Clear(BatchKind),
    /// Show both selections
    Selected,
    /// Show the roster with checkboxes for the given selection
    List(BatchKind),
    /// Reload the roster from the server
    Refresh,
    /// Delete every member in the delete selection
    Delete,
    /// Apply the payload to every member in the update selection
    Update(UpdatePayload),
    Help,
    Quit,
}

/// Parse one input line; a leading `/` is accepted and ignored
pub fn parse_command(input: &str) -> Result<ShellCommand, String> {
    let input = input.trim().trim_start_matches('/');
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((cmd, args)) = parts.split_first() else {
        return Err("Empty command".to_string());
    };

    match cmd.to_lowercase().as_str() {
        "select" | "s" => {
            let (kind, ids) = parse_kind_and_ids(args)?;
            Ok(ShellCommand::Select { kind, ids })
        }
        "unselect" | "u" => {
            let (kind, ids) = parse_kind_and_ids(args)?;
            Ok(ShellCommand::Unselect { kind, ids })
        }
        "clear" => match args {
            [kind] => Ok(ShellCommand::Clear(kind.parse()?)),
            _ => Err("Usage: clear <delete|update>".to_string()),
        },
        "selected" => Ok(ShellCommand::Selected),
        "list" | "ls" => match args {
            [] => Ok(ShellCommand::List(BatchKind::Delete)),
            [kind] => Ok(ShellCommand::List(kind.parse()?)),
            _ => Err("Usage: list [delete|update]".to_string()),
        },
        "refresh" | "r" => Ok(ShellCommand::Refresh),
        "delete" => Ok(ShellCommand::Delete),
        "update" => {
            let payload = parse_assignments(args)?;
            payload.validate().map_err(|e| e.to_string())?;
            Ok(ShellCommand::Update(payload))
        }
        "help" | "h" | "?" => Ok(ShellCommand::Help),
        "quit" | "q" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn parse_kind_and_ids(args: &[&str]) -> Result<(BatchKind, Vec<MemberId>), String> {
    let Some((kind, ids)) = args.split_first() else {
        return Err("Usage: select|unselect <delete|update> <id>...".to_string());
    };
    let kind: BatchKind = kind.parse()?;
    if ids.is_empty() {
        return Err(format!("No ids given for {}", kind));
    }
    let ids = ids.iter().map(|s| s.parse()).collect::<Result<Vec<MemberId>, _>>()?;
    Ok((kind, ids))
}

/// Parse `field=value` words into a payload
///
/// Each value runs to the next whitespace.
pub fn parse_assignments(args: &[&str]) -> Result<UpdatePayload, String> {
    let mut payload = UpdatePayload::default();
    for arg in args {
        let Some((field, value)) = arg.split_once('=') else {
            return Err(format!("Expected field=value, got '{}'", arg));
        };
        let value = Some(value.to_string());
        match field.to_lowercase().as_str() {
            "name" => payload.name = value,
            "role" => payload.role = value,
            "bio" => payload.bio = value,
            "photo" => payload.photo = value,
            other => return Err(format!("Unknown field: {}. Use: name, role, bio, photo", other)),
        }
    }
    Ok(payload)
}
