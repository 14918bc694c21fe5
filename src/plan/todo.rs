//! Git-style todo list rendering and parsing for a `RebasePlan`.

use std::collections::HashSet;

use super::{PlanEntry, PlanError, RebasePlan};
use crate::action::Action;

/// Help text appended (commented) below a rendered todo list.
pub const TODO_HELP: &str = "\
Commands:
p, pick <commit> = use commit
r, reword <commit> = use commit, but edit the commit message
e, edit <commit> = use commit, but stop for amending
s, squash <commit> = use commit, but meld into previous commit
f, fixup <commit> = like \"squash\", but discard this commit's message
d, drop <commit> = remove commit

These lines can be re-ordered; they are executed from top to bottom.
If you remove a line here THAT COMMIT WILL BE DROPPED.";

impl RebasePlan {
    /// Render the plan as a todo list, one `<action> <short-id> <subject>` line per entry.
    pub fn to_todo(&self) -> String {
        self.entries()
            .iter()
            .map(|e| format!("{} {} {}", e.action, e.commit.short_id, e.commit.subject()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Apply an edited todo list to this plan.
    ///
    /// Listed commits take the listed order and action. Commits missing from
    /// the list are kept as `drop` entries after the listed ones.
    pub fn apply_todo(&self, text: &str) -> Result<Self, PlanError> {
        let mut listed: Vec<PlanEntry> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();

        for (line_no, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line = line_no + 1;
            let mut parts = trimmed.split_whitespace();
            let (Some(keyword), Some(id)) = (parts.next(), parts.next()) else {
                return Err(PlanError::MalformedLine { line });
            };
            let action: Action = keyword
                .parse()
                .map_err(|source| PlanError::Action { line, source })?;

            let index = self.resolve_commit(id, line)?;
            if !seen.insert(index) {
                return Err(PlanError::DuplicateCommit {
                    line,
                    id: id.to_string(),
                });
            }

            let mut entry = self.entries()[index].clone();
            if entry.action != action {
                entry.coerced = false;
            }
            entry.action = action;
            listed.push(entry);
        }

        let mut removed: Vec<PlanEntry> = self
            .entries()
            .iter()
            .enumerate()
            .filter(|(i, _)| !seen.contains(i))
            .map(|(_, e)| PlanEntry {
                action: Action::Drop,
                coerced: false,
                ..e.clone()
            })
            .collect();
        removed.sort_by_key(|e| e.original_index);
        listed.extend(removed);

        Self::from_entries(listed)
    }

    fn resolve_commit(&self, id: &str, line: usize) -> Result<usize, PlanError> {
        let mut matches = self
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.commit.matches_id(id))
            .map(|(i, _)| i);

        match (matches.next(), matches.next()) {
            (Some(index), None) => Ok(index),
            (Some(_), Some(_)) => Err(PlanError::AmbiguousCommit {
                line,
                id: id.to_string(),
            }),
            (None, _) => Err(PlanError::UnknownCommit {
                line,
                id: id.to_string(),
            }),
        }
    }
}
