//! Console formatting for conversation transcripts

use colored::Colorize;
use streamchat_domain::util::preview;
use streamchat_domain::{FailureReason, ModeCatalog, Role, Turn, TurnStatus};

/// Longest per-turn preview in `/history`.
const PREVIEW_BYTES: usize = 72;

/// Formats conversation state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Marker printed after an errored assistant turn.
    pub fn failure_marker(reason: &FailureReason) -> String {
        match reason {
            FailureReason::Cancelled => format!("[{}]", "cancelled".yellow()),
            other => format!("[{}]", other.to_string().red()),
        }
    }

    /// One line per turn: id, role, status and a content preview.
    pub fn transcript(turns: &[Turn]) -> String {
        if turns.is_empty() {
            return format!("{}\n", "(conversation is empty)".dimmed());
        }

        let mut output = String::new();
        for turn in turns {
            let role = match turn.role() {
                Role::User => "user".cyan().bold(),
                Role::Assistant => "assistant".green().bold(),
                Role::System => "system".magenta().bold(),
            };
            let status = match turn.status() {
                TurnStatus::Complete => String::new(),
                TurnStatus::Errored => match turn.failure() {
                    Some(reason) => format!(" {}", Self::failure_marker(reason)),
                    None => " [errored]".to_string(),
                },
                other => format!(" [{}]", other.as_str().dimmed()),
            };
            output.push_str(&format!(
                "{:>8} {}{}: {}\n",
                turn.id().to_string().dimmed(),
                role,
                status,
                preview(turn.content(), PREVIEW_BYTES)
            ));
        }
        output
    }

    /// Mode table, marking `current`.
    pub fn modes(catalog: &ModeCatalog, current: &str) -> String {
        let mut output = String::new();
        for (key, model) in catalog.iter() {
            let marker = if key == current { "*" } else { " " };
            output.push_str(&format!("  {} {:<12} {}\n", marker, key.bold(), model));
        }
        output
    }
}
