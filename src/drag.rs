//! Classification of commit-graph drag gestures into repository operations.
//!
//! `classify` is pure: it only describes the operation and the equivalent
//! command line. Dispatching it (after confirmation, for dangerous operations)
//! is up to the caller.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::models::{BranchRef, CommitRef, TagRef};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DragSource {
    /// A commit node, with the branch lane it is drawn in
    Commit { commit: CommitRef, branch: String },
    /// A branch label (moves the branch's work)
    Branch { branch: BranchRef },
    /// A branch tip handle (moves only the pointer)
    BranchPointer { branch: BranchRef },
    Tag { tag: TagRef },
}

/// Where it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DropTarget {
    Commit { commit: CommitRef },
    Branch { branch: BranchRef },
    EmptySpace { x: i32, y: i32 },
    /// A slot between commits in a branch lane
    Position { branch: String, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitOperation {
    Rebase,
    CherryPick,
    MoveBranch,
    Merge,
    CreateBranch,
    ReorderCommits,
    Invalid,
}

impl GitOperation {
    /// Operations that rewrite history or move refs; callers confirm these first.
    pub fn is_dangerous(self) -> bool {
        match self {
            GitOperation::Rebase | GitOperation::MoveBranch | GitOperation::ReorderCommits => true,
            GitOperation::CherryPick
            | GitOperation::Merge
            | GitOperation::CreateBranch
            | GitOperation::Invalid => false,
        }
    }
}

impl Display for GitOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GitOperation::Rebase => "rebase",
            GitOperation::CherryPick => "cherry-pick",
            GitOperation::MoveBranch => "move-branch",
            GitOperation::Merge => "merge",
            GitOperation::CreateBranch => "create-branch",
            GitOperation::ReorderCommits => "reorder-commits",
            GitOperation::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDecision {
    pub operation: GitOperation,
    pub is_valid: bool,
    pub description: String,
    /// Human-readable equivalent command line; never executed here
    pub command: String,
    pub dangerous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl OperationDecision {
    fn valid(operation: GitOperation, description: String, command: String) -> Self {
        Self {
            operation,
            is_valid: true,
            description,
            command,
            dangerous: operation.is_dangerous(),
            warning: None,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            operation: GitOperation::Invalid,
            is_valid: false,
            description: reason.into(),
            command: String::new(),
            dangerous: false,
            warning: None,
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Decide what dropping `source` on `target` means while `current_branch` is checked out.
pub fn classify(
    source: &DragSource,
    target: &DropTarget,
    current_branch: &str,
) -> OperationDecision {
    match (source, target) {
        (DragSource::Commit { commit, .. }, DropTarget::Commit { commit: onto }) => {
            if commit.id == onto.id {
                return OperationDecision::invalid("Cannot rebase a commit onto itself");
            }
            OperationDecision::valid(
                GitOperation::Rebase,
                format!("Rebase {} onto {}", commit.short_id, onto.short_id),
                format!("rebase {}", onto.short_id),
            )
            .with_warning("Rewrites history; commits after the rebased one get new ids")
        }

        (DragSource::Branch { branch }, DropTarget::Commit { commit: onto }) => {
            if branch.is_remote {
                return OperationDecision::invalid(format!(
                    "Cannot rebase remote-tracking branch {}",
                    branch.name
                ));
            }
            OperationDecision::valid(
                GitOperation::Rebase,
                format!("Rebase {} onto {}", branch.name, onto.short_id),
                with_checkout(
                    &branch.name,
                    current_branch,
                    format!("rebase {}", onto.short_id),
                ),
            )
            .with_warning(format!("Rewrites the history of {}", branch.name))
        }

        (DragSource::Commit { commit, .. }, DropTarget::Branch { branch }) => {
            OperationDecision::valid(
                GitOperation::CherryPick,
                format!("Cherry-pick {} onto {}", commit.short_id, branch.name),
                with_checkout(
                    &branch.name,
                    current_branch,
                    format!("cherry-pick {}", commit.short_id),
                ),
            )
        }

        (DragSource::BranchPointer { branch }, DropTarget::Commit { commit: onto }) => {
            if branch.is_remote {
                return OperationDecision::invalid(format!(
                    "Cannot move remote-tracking branch {}",
                    branch.name
                ));
            }
            if branch.commit_id == onto.id {
                return OperationDecision::invalid(format!(
                    "{} already points at {}",
                    branch.name, onto.short_id
                ));
            }
            let command = if branch.name == current_branch {
                format!("reset --hard {}", onto.short_id)
            } else {
                format!("branch -f {} {}", branch.name, onto.short_id)
            };
            OperationDecision::valid(
                GitOperation::MoveBranch,
                format!("Move {} to {}", branch.name, onto.short_id),
                command,
            )
            .with_warning(format!(
                "Commits reachable only from {} may become unreachable",
                branch.name
            ))
        }

        (DragSource::Branch { branch: from }, DropTarget::Branch { branch: into }) => {
            if from.name == into.name {
                return OperationDecision::invalid(format!(
                    "Cannot merge {} into itself",
                    from.name
                ));
            }
            OperationDecision::valid(
                GitOperation::Merge,
                format!("Merge {} into {}", from.name, into.name),
                with_checkout(&into.name, current_branch, format!("merge {}", from.name)),
            )
        }

        (DragSource::Commit { commit, .. }, DropTarget::EmptySpace { .. }) => {
            OperationDecision::valid(
                GitOperation::CreateBranch,
                format!("Create a new branch at {}", commit.short_id),
                format!("branch <new-branch> {}", commit.short_id),
            )
        }

        (DragSource::Commit { commit, branch }, DropTarget::Position { branch: lane, index }) => {
            if branch != lane {
                return OperationDecision::invalid(format!(
                    "Cannot reorder {} from {} into {}",
                    commit.short_id, branch, lane
                ));
            }
            OperationDecision::valid(
                GitOperation::ReorderCommits,
                format!(
                    "Move {} to position {} on {}",
                    commit.short_id, index, branch
                ),
                format!("rebase -i {}^", commit.short_id),
            )
            .with_warning("Rewrites history; reordered commits get new ids")
        }

        (DragSource::Tag { tag }, _) => {
            OperationDecision::invalid(format!("Tag {} cannot be dragged", tag.name))
        }

        (DragSource::Branch { .. } | DragSource::BranchPointer { .. }, _) => {
            OperationDecision::invalid("No operation for this drop")
        }
    }
}

fn with_checkout(branch: &str, current_branch: &str, command: String) -> String {
    if branch == current_branch {
        command
    } else {
        format!("checkout {} && {}", branch, command)
    }
}
