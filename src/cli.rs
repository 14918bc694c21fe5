use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::drag::{DragSource, DropTarget};
use crate::features::Feature;
use crate::models::{BranchRef, CommitLookupError, RepoSnapshot};

/// Command line interface definition for git-replan.
#[derive(Parser, Debug)]
#[command(name = "git-replan")]
#[command(about = "Plan and preview interactive rebases; classify commit-graph drags")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Enable feature flags (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',', global = true)]
    pub features: Option<Vec<Feature>>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the default todo list for a snapshot
    Todo(SnapshotArgs),
    /// Show the history a (possibly edited) todo list will produce
    Preview(PreviewArgs),
    /// Classify dropping SOURCE on TARGET
    Classify(ClassifyArgs),
    /// Compose the combined message of a squash/fixup run
    Squash(SquashArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Repository snapshot (JSON) supplied by the UI layer
    #[arg(short, long, env = "GIT_REPLAN_SNAPSHOT")]
    pub snapshot: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Edited todo list; without it the default all-pick plan is shown
    #[arg(short, long)]
    pub todo: Option<PathBuf>,

    /// Open the todo list in $EDITOR before previewing
    #[arg(long, conflicts_with = "todo")]
    pub edit: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// commit:<id>, branch:<name>, pointer:<name> or tag:<name>
    #[arg(long)]
    pub source: SourceSpec,

    /// commit:<id>, branch:<name>, empty or position:<branch>:<index>
    #[arg(long)]
    pub target: TargetSpec,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SquashArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Todo list containing the squash/fixup run
    #[arg(short, long)]
    pub todo: PathBuf,

    /// Which fold group to compose (0-based, in plan order)
    #[arg(short, long, default_value_t = 0)]
    pub group: usize,

    /// Open the composed message in $EDITOR
    #[arg(long)]
    pub edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragSpecError {
    #[error("Expected <kind>:<value>, got '{0}'")]
    Malformed(String),
    #[error("Unknown drag kind '{0}'")]
    UnknownKind(String),
    #[error("Invalid position index '{0}'")]
    BadIndex(String),
    #[error(transparent)]
    Commit(#[from] CommitLookupError),
    #[error("No branch '{0}' in the snapshot")]
    UnknownBranch(String),
    #[error("No tag '{0}' in the snapshot")]
    UnknownTag(String),
}

/// A drag source named on the command line, resolved later against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Commit(String),
    Branch(String),
    Pointer(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Commit(String),
    Branch(String),
    Empty,
    Position { branch: String, index: usize },
}

fn split_spec(s: &str) -> Result<(&str, &str), DragSpecError> {
    match s.split_once(':') {
        Some((kind, value)) if !value.is_empty() => Ok((kind, value)),
        _ => Err(DragSpecError::Malformed(s.to_string())),
    }
}

impl FromStr for SourceSpec {
    type Err = DragSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = split_spec(s)?;
        let value = value.to_string();
        match kind {
            "commit" => Ok(SourceSpec::Commit(value)),
            "branch" => Ok(SourceSpec::Branch(value)),
            "pointer" => Ok(SourceSpec::Pointer(value)),
            "tag" => Ok(SourceSpec::Tag(value)),
            other => Err(DragSpecError::UnknownKind(other.to_string())),
        }
    }
}

impl FromStr for TargetSpec {
    type Err = DragSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "empty" {
            return Ok(TargetSpec::Empty);
        }
        let (kind, value) = split_spec(s)?;
        match kind {
            "commit" => Ok(TargetSpec::Commit(value.to_string())),
            "branch" => Ok(TargetSpec::Branch(value.to_string())),
            "position" => {
                let (branch, index) = value
                    .rsplit_once(':')
                    .ok_or_else(|| DragSpecError::Malformed(s.to_string()))?;
                let index = index
                    .parse()
                    .map_err(|_| DragSpecError::BadIndex(index.to_string()))?;
                Ok(TargetSpec::Position {
                    branch: branch.to_string(),
                    index,
                })
            }
            other => Err(DragSpecError::UnknownKind(other.to_string())),
        }
    }
}

impl SourceSpec {
    pub fn resolve(&self, snapshot: &RepoSnapshot) -> Result<DragSource, DragSpecError> {
        match self {
            SourceSpec::Commit(id) => {
                let commit = snapshot.find_commit(id)?;
                Ok(DragSource::Commit {
                    branch: snapshot.branch_of(commit),
                    commit: commit.clone(),
                })
            }
            SourceSpec::Branch(name) => Ok(DragSource::Branch {
                branch: find_branch(snapshot, name)?,
            }),
            SourceSpec::Pointer(name) => Ok(DragSource::BranchPointer {
                branch: find_branch(snapshot, name)?,
            }),
            SourceSpec::Tag(name) => {
                let tag = snapshot
                    .find_tag(name)
                    .ok_or_else(|| DragSpecError::UnknownTag(name.clone()))?;
                Ok(DragSource::Tag { tag: tag.clone() })
            }
        }
    }
}

impl TargetSpec {
    pub fn resolve(&self, snapshot: &RepoSnapshot) -> Result<DropTarget, DragSpecError> {
        match self {
            TargetSpec::Commit(id) => {
                let commit = snapshot.find_commit(id)?;
                Ok(DropTarget::Commit {
                    commit: commit.clone(),
                })
            }
            TargetSpec::Branch(name) => Ok(DropTarget::Branch {
                branch: find_branch(snapshot, name)?,
            }),
            TargetSpec::Empty => Ok(DropTarget::EmptySpace { x: 0, y: 0 }),
            TargetSpec::Position { branch, index } => Ok(DropTarget::Position {
                branch: branch.clone(),
                index: *index,
            }),
        }
    }
}

fn find_branch(
    snapshot: &RepoSnapshot,
    name: &str,
) -> Result<BranchRef, DragSpecError> {
    snapshot
        .find_branch(name)
        .cloned()
        .ok_or_else(|| DragSpecError::UnknownBranch(name.to_string()))
}
