//! The rebase plan: one entry per commit in the selected range, oldest first.
//!
//! A `RebasePlan` is a value. Every mutator returns a new plan and the fold
//! invariants are re-established on construction, so no plan value ever holds
//! a `squash`/`fixup` entry without a commit to fold into.

pub mod todo;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::action::{Action, UnknownAction};
use crate::features::Feature;
use crate::models::CommitRef;
use crate::utils::short_sha;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("No commits in the selected range")]
    Empty,
    #[error("Line {line}: {source}")]
    Action { line: usize, source: UnknownAction },
    #[error("Line {line}: expected '<action> <commit> [subject]'")]
    MalformedLine { line: usize },
    #[error("Line {line}: unknown commit '{id}'")]
    UnknownCommit { line: usize, id: String },
    #[error("Line {line}: '{id}' matches more than one commit")]
    AmbiguousCommit { line: usize, id: String },
    #[error("Line {line}: commit '{id}' is listed more than once")]
    DuplicateCommit { line: usize, id: String },
}

/// One commit and what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub commit: CommitRef,
    pub action: Action,
    /// Position of the commit when the session started
    pub original_index: usize,
    /// User-edited message, used for `reword` and for squash fold targets
    #[serde(default)]
    pub message: Option<String>,
    /// Set when the invariant coerced a fold action on this entry to `pick`
    #[serde(default)]
    pub coerced: bool,
}

impl PlanEntry {
    pub fn new(commit: CommitRef, original_index: usize) -> Self {
        Self {
            commit,
            action: Action::Pick,
            original_index,
            message: None,
            coerced: false,
        }
    }

    /// The message this entry's commit will carry if it survives on its own.
    pub fn effective_message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.commit.message)
    }
}

/// A maximal run of `squash`/`fixup` entries and the entry they fold into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldGroup {
    pub target: usize,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlanEntry>", into = "Vec<PlanEntry>")]
pub struct RebasePlan {
    entries: Vec<PlanEntry>,
}

impl RebasePlan {
    /// Start a plan over `commits` (oldest first), every entry picked.
    pub fn new(commits: Vec<CommitRef>) -> Result<Self, PlanError> {
        let entries = commits
            .into_iter()
            .enumerate()
            .map(|(i, commit)| PlanEntry::new(commit, i))
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<PlanEntry>) -> Result<Self, PlanError> {
        if entries.is_empty() {
            return Err(PlanError::Empty);
        }
        normalize(&mut entries);
        Ok(Self { entries })
    }

    fn with_entries(&self, mut entries: Vec<PlanEntry>) -> Self {
        normalize(&mut entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlanEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a plan holds at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the action at `index`.
    ///
    /// Out-of-range indices are a caller bug: they assert in debug builds and
    /// leave the plan unchanged otherwise.
    #[must_use]
    pub fn set_action(&self, index: usize, action: Action) -> Self {
        debug_assert!(index < self.len(), "set_action index {} out of range", index);
        let Some(entry) = self.entries.get(index) else {
            return self.clone();
        };
        if entry.action == action && !entry.coerced {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries[index].action = action;
        entries[index].coerced = false;
        self.with_entries(entries)
    }

    /// Record an edited message on the entry at `index` (`None` restores the original).
    #[must_use]
    pub fn set_message(&self, index: usize, message: Option<String>) -> Self {
        debug_assert!(index < self.len(), "set_message index {} out of range", index);
        if index >= self.len() {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries[index].message = message;
        self.with_entries(entries)
    }

    /// Remove the entry at `from` and reinsert it at `to`.
    ///
    /// `to` is an index into the sequence after removal, as with a list splice.
    #[must_use]
    pub fn move_entry(&self, from: usize, to: usize) -> Self {
        debug_assert!(
            from < self.len() && to < self.len(),
            "move_entry {} -> {} out of range",
            from,
            to
        );
        if from >= self.len() || to >= self.len() {
            return self.clone();
        }
        if from == to {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        let entry = entries.remove(from);
        entries.insert(to, entry);
        self.with_entries(entries)
    }

    /// Original order, every entry picked, edited messages discarded.
    #[must_use]
    pub fn reset(&self) -> Self {
        let mut entries: Vec<PlanEntry> = self
            .entries
            .iter()
            .map(|e| PlanEntry::new(e.commit.clone(), e.original_index))
            .collect();
        entries.sort_by_key(|e| e.original_index);
        self.with_entries(entries)
    }

    /// Index of the entry that the fold entry at `index` melds into.
    ///
    /// Dropped entries are skipped; they do not exist in the new history.
    pub fn fold_target_of(&self, index: usize) -> Option<usize> {
        let entry = self.entries.get(index)?;
        if !entry.action.is_fold() {
            return None;
        }
        self.entries[..index]
            .iter()
            .rposition(|e| e.action.survives())
    }

    /// Group every run of `squash`/`fixup` by its fold target, in plan order.
    pub fn fold_groups(&self) -> Vec<FoldGroup> {
        let mut groups: Vec<FoldGroup> = Vec::new();
        let mut current_target: Option<usize> = None;

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.action.survives() {
                current_target = Some(i);
            } else if entry.action.is_fold() {
                let Some(target) = current_target else {
                    continue;
                };
                match groups.last_mut() {
                    Some(group) if group.target == target => group.members.push(i),
                    _ => groups.push(FoldGroup {
                        target,
                        members: vec![i],
                    }),
                }
            }
        }

        groups
    }

    /// Number of commits the rewritten history will contain.
    pub fn surviving_count(&self) -> usize {
        self.entries.iter().filter(|e| e.action.survives()).count()
    }
}

impl TryFrom<Vec<PlanEntry>> for RebasePlan {
    type Error = PlanError;

    fn try_from(entries: Vec<PlanEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<RebasePlan> for Vec<PlanEntry> {
    fn from(plan: RebasePlan) -> Self {
        plan.entries
    }
}

/// Coerce every fold entry that has nothing to meld into back to `pick`.
fn normalize(entries: &mut [PlanEntry]) {
    let mut has_survivor = false;
    for (i, entry) in entries.iter_mut().enumerate() {
        if entry.action.is_fold() && !has_survivor {
            if Feature::WarnOnCoercion.is_enabled() {
                warn!(
                    "{} at position {} has no commit to fold into; using pick",
                    short_sha(&entry.commit.id),
                    i
                );
            } else {
                debug!(
                    "Coercing {} {} to pick (no fold target)",
                    entry.action,
                    short_sha(&entry.commit.id)
                );
            }
            entry.action = Action::Pick;
            entry.coerced = true;
        }
        if entry.action.survives() {
            has_survivor = true;
        }
    }
}
