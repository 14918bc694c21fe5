//! Projection of a plan onto the history it will produce.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::plan::RebasePlan;
use crate::squash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreviewStatus {
    Kept,
    Reworded,
    Edited,
    Squashed,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub short_id: String,
    /// Subject line the commit will carry (or carried, for folded and dropped entries)
    pub message: String,
    pub status: PreviewStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// One row per plan entry, in plan order; nothing is hidden
    pub entries: Vec<PreviewEntry>,
    pub surviving_count: usize,
}

impl Preview {
    pub fn entries_with(&self, status: PreviewStatus) -> impl Iterator<Item = &PreviewEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }
}

/// Project `plan` onto the post-rebase history.
pub fn project(plan: &RebasePlan) -> Preview {
    let entries = plan
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            // Same cleanup the executed step applies to an edited message
            let edited = entry
                .message
                .as_deref()
                .and_then(|m| squash::extract_final(m).ok());
            let message = edited
                .as_deref()
                .unwrap_or(&entry.commit.message)
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .to_string();

            let (status, note) = match entry.action {
                Action::Pick => (PreviewStatus::Kept, None),
                Action::Reword => (
                    PreviewStatus::Reworded,
                    Some("(message will be edited)".to_string()),
                ),
                Action::Edit => (
                    PreviewStatus::Edited,
                    Some("(will stop for amending)".to_string()),
                ),
                Action::Squash | Action::Fixup => {
                    let target = plan
                        .fold_target_of(i)
                        .and_then(|t| plan.get(t))
                        .map(|t| t.commit.short_id.as_str())
                        .unwrap_or("?");
                    let kept = if entry.action == Action::Squash {
                        "message kept"
                    } else {
                        "message discarded"
                    };
                    (
                        PreviewStatus::Squashed,
                        Some(format!("(into {}, {})", target, kept)),
                    )
                }
                Action::Drop => (
                    PreviewStatus::Dropped,
                    Some("(will be dropped)".to_string()),
                ),
            };

            PreviewEntry {
                short_id: entry.commit.short_id.clone(),
                message,
                status,
                note,
            }
        })
        .collect();

    Preview {
        entries,
        surviving_count: plan.surviving_count(),
    }
}
