//! Resumable, step-at-a-time application of a rebase plan.

mod controller;
mod session;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::plan::RebasePlan;
use crate::squash::{self, SquashError};

pub use controller::{ExecutionController, Next};
pub use session::{RebaseSession, RunnerError, StepRunner};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Cannot {event} while the rebase is {status}")]
    InvalidTransition {
        event: &'static str,
        status: ExecutionStatus,
    },
    #[error("Unresolved conflicts in: {}", .0.join(", "))]
    UnresolvedConflicts(Vec<String>),
    #[error("'{0}' is not one of the conflicted files")]
    UnknownConflictFile(String),
    #[error(transparent)]
    Message(#[from] SquashError),
    #[error("Applying {commit} failed: {message}")]
    StepFailed { commit: String, message: String },
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Aborted)
    }
}

impl Display for ExecutionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExecutionStatus::Idle => "idle",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Paused => "paused",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionProgress {
    /// Index of the step in flight (or next to issue)
    pub current_index: usize,
    pub total: usize,
    pub completed_ids: BTreeSet<String>,
    /// Steps skipped after a conflict during this run
    #[serde(default)]
    pub skipped_ids: BTreeSet<String>,
    pub status: ExecutionStatus,
}

/// Why a paused run is waiting on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseReason {
    /// The step conflicted; resolve every file, then continue or skip
    Conflict,
    /// An `edit` step applied cleanly and stopped for amending
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFile {
    pub path: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictState {
    pub commit_id: String,
    pub conflicted_files: Vec<ConflictFile>,
}

impl ConflictState {
    pub fn new(commit_id: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            commit_id: commit_id.into(),
            conflicted_files: files
                .into_iter()
                .map(|path| ConflictFile {
                    path,
                    resolved: false,
                })
                .collect(),
        }
    }

    pub fn unresolved(&self) -> Vec<String> {
        self.conflicted_files
            .iter()
            .filter(|f| !f.resolved)
            .map(|f| f.path.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Pick,
    Reword,
    /// Apply, then pause the run until the user continues
    Edit,
    /// Apply the target and meld the folded commits into it
    Meld,
}

/// One instruction for the external command-execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyStep {
    pub kind: StepKind,
    pub target_commit_id: String,
    /// Commits melded into the target, in plan order (only for `meld`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folded_commit_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_message: Option<String>,
}

/// What the collaborator reports back for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum StepOutcome {
    Success,
    Conflict { files: Vec<String> },
    /// Unrecoverable failure; the run is aborted
    Failed { message: String },
}

/// Turn a plan into the ordered steps that produce its surviving commits.
///
/// Edited messages go through `squash::extract_final`, so a message left
/// empty once comments are stripped is an error here rather than at the
/// collaborator. A `pick` carrying an edited message becomes a `reword` step.
pub fn build_steps(plan: &RebasePlan) -> Result<Vec<ApplyStep>, SquashError> {
    let groups = plan.fold_groups();
    let mut steps = Vec::with_capacity(plan.surviving_count());

    for (i, entry) in plan.entries().iter().enumerate() {
        if !entry.action.survives() {
            continue;
        }

        let step = if let Some(group) = groups.iter().find(|g| g.target == i) {
            ApplyStep {
                kind: StepKind::Meld,
                target_commit_id: entry.commit.id.clone(),
                folded_commit_ids: group
                    .members
                    .iter()
                    .filter_map(|m| plan.get(*m))
                    .map(|m| m.commit.id.clone())
                    .collect(),
                new_message: Some(squash::final_message(plan, group)?),
            }
        } else {
            let new_message = entry
                .message
                .as_deref()
                .map(squash::extract_final)
                .transpose()?;
            let kind = match entry.action {
                Action::Pick if new_message.is_some() => StepKind::Reword,
                Action::Pick => StepKind::Pick,
                Action::Reword => StepKind::Reword,
                Action::Edit => StepKind::Edit,
                Action::Squash | Action::Fixup | Action::Drop => continue,
            };
            ApplyStep {
                kind,
                target_commit_id: entry.commit.id.clone(),
                folded_commit_ids: Vec::new(),
                new_message,
            }
        };
        steps.push(step);
    }

    Ok(steps)
}
