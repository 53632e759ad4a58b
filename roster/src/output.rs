//! Terminal rendering for members and batch reports

use std::collections::BTreeSet;

use colored::Colorize;
use eyre::Result;

use crate::cli::OutputFormat;
use crate::domain::{MemberId, TeamMember};
use crate::workflow::BatchReport;

const BIO_PREVIEW_CHARS: usize = 48;

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > BIO_PREVIEW_CHARS {
        format!("{}...", flat.chars().take(BIO_PREVIEW_CHARS).collect::<String>())
    } else {
        flat
    }
}

/// Render the member list; `selected` marks rows with a ticked checkbox
pub fn render_members(members: &[TeamMember], selected: &BTreeSet<MemberId>, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(members)?),
        OutputFormat::Text | OutputFormat::Table => {
            if members.is_empty() {
                return Ok("No team members".dimmed().to_string());
            }
            let mut out = String::new();
            if matches!(format, OutputFormat::Table) {
                out.push_str(&format!("    {:<6} {:<24} {:<20} {}\n", "ID", "NAME", "ROLE", "BIO"));
            }
            for m in members {
                let check = if selected.contains(&m.id) { "[x]" } else { "[ ]" };
                out.push_str(&format!(
                    "{} {:<6} {:<24} {:<20} {}\n",
                    check,
                    m.id.to_string().yellow(),
                    m.name.bold(),
                    m.role.cyan(),
                    preview(&m.bio).dimmed()
                ));
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// Render one member in full
pub fn render_member(member: &TeamMember, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(member)?),
        OutputFormat::Text | OutputFormat::Table => {
            let mut out = format!("{} {}\n", member.name.bold(), format!("#{}", member.id).dimmed());
            out.push_str(&format!("  Role:  {}\n", member.role.cyan()));
            out.push_str(&format!("  Bio:   {}\n", member.bio));
            if let Some(photo) = &member.photo {
                out.push_str(&format!("  Photo: {}\n", preview(photo)));
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// Render a finished batch, listing each failure with its reason
pub fn render_report(report: &BatchReport, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text | OutputFormat::Table => {
            let icon = if report.outcome.is_noop() {
                "-".dimmed()
            } else if report.has_failures() {
                "✗".red()
            } else {
                "✓".green()
            };
            let mut out = format!("{} {}", icon, report.summary());
            if report.has_failures() {
                for (id, reason) in &report.outcome.failed {
                    out.push_str(&format!("\n  {} {}", id.to_string().yellow(), reason.message.red()));
                }
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchKind, BatchOutcome, FailureReason};

    fn member(id: i64, bio: &str) -> TeamMember {
        TeamMember {
            id: MemberId::from(id),
            name: format!("Member {}", id),
            role: "Engineer".to_string(),
            bio: bio.to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), BIO_PREVIEW_CHARS + 3);
        assert_eq!(preview("a\nb"), "a b");
    }

    #[test]
    fn test_render_members_marks_selection() {
        colored::control::set_override(false);
        let members = vec![member(1, "one"), member(2, "two")];
        let selected: BTreeSet<MemberId> = [MemberId::from(2)].into_iter().collect();

        let out = render_members(&members, &selected, &OutputFormat::Text).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("[ ] 1"));
        assert!(lines[1].starts_with("[x] 2"));
    }

    #[test]
    fn test_render_members_json() {
        let members = vec![member(1, "one")];
        let out = render_members(&members, &BTreeSet::new(), &OutputFormat::Json).unwrap();
        let parsed: Vec<TeamMember> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, members);
    }

    #[test]
    fn test_render_report_lists_failures() {
        colored::control::set_override(false);
        let report = BatchReport {
            kind: BatchKind::Delete,
            rounds: 1,
            outcome: BatchOutcome::from_settled(vec![
                (MemberId::from(1), Ok(())),
                (MemberId::from(2), Err(FailureReason::new("Member not found"))),
            ]),
            removed: vec![member(1, "one")],
        };

        let out = render_report(&report, &OutputFormat::Text).unwrap();
        assert!(out.starts_with("✗ 1 of 2 deleted; 1 failed"));
        assert!(out.contains("2 Member not found"));
    }
}
