//! Combined commit messages for squash/fixup runs.

use crate::action::Action;
use crate::plan::{FoldGroup, PlanEntry, RebasePlan};

/// Lines whose first non-whitespace character is this marker are informational.
pub const COMMENT_MARKER: char = '#';

#[derive(Debug, thiserror::Error)]
pub enum SquashError {
    #[error("Empty commit message: nothing remains once comment lines are removed")]
    EmptyMessage,
}

/// The fold target followed by its members, in plan order.
pub fn group_entries<'a>(plan: &'a RebasePlan, group: &FoldGroup) -> Vec<&'a PlanEntry> {
    std::iter::once(group.target)
        .chain(group.members.iter().copied())
        .filter_map(|i| plan.get(i))
        .collect()
}

/// Build the editable message for a fold run.
///
/// `entries[0]` is the fold target. Its message leads the text; every entry then
/// gets a numbered block. `fixup` messages, and the target's own copy, are
/// commented out so that `extract_final` keeps each message exactly once.
pub fn compose(entries: &[&PlanEntry]) -> String {
    let Some(target) = entries.first() else {
        return String::new();
    };

    let mut blocks = vec![target.effective_message().trim().to_string()];

    for (k, entry) in entries.iter().enumerate() {
        let ordinal = ordinal(k + 1);
        let message = entry.effective_message().trim();

        let (header, body) = if k == 0 {
            (
                format!(
                    "{m} This is the combination of {} commits.\n{m} This is the {} commit message:",
                    entries.len(),
                    ordinal,
                    m = COMMENT_MARKER
                ),
                comment_out(message),
            )
        } else if entry.action == Action::Fixup {
            (
                format!(
                    "{} The {} commit message will be skipped:",
                    COMMENT_MARKER, ordinal
                ),
                comment_out(message),
            )
        } else {
            (
                format!("{} This is the {} commit message:", COMMENT_MARKER, ordinal),
                message.to_string(),
            )
        };

        blocks.push(format!("{}\n\n{}", header, body));
    }

    blocks.join("\n\n")
}

/// Remove comment lines, collapse runs of blank lines, and trim.
pub fn extract_final(raw: &str) -> Result<String, SquashError> {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        if line.trim_start().starts_with(COMMENT_MARKER) {
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() && lines.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    let message = lines.join("\n").trim().to_string();
    if message.is_empty() {
        return Err(SquashError::EmptyMessage);
    }
    Ok(message)
}

/// Final message for a fold group: the user's edit on the target if any,
/// otherwise the composed text with comments stripped.
pub fn final_message(plan: &RebasePlan, group: &FoldGroup) -> Result<String, SquashError> {
    let entries = group_entries(plan, group);
    if let Some(edited) = entries.first().and_then(|t| t.message.as_deref()) {
        return extract_final(edited);
    }
    extract_final(&compose(&entries))
}

fn comment_out(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                COMMENT_MARKER.to_string()
            } else {
                format!("{} {}", COMMENT_MARKER, l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
