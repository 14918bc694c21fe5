mod report;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cli::{ClassifyArgs, Command, DragSpecError, PreviewArgs, SnapshotArgs, SquashArgs};
use crate::drag;
use crate::editor::{Editor, EditorError};
use crate::models::RepoSnapshot;
use crate::plan::todo::TODO_HELP;
use crate::plan::{PlanError, RebasePlan};
use crate::preview;
use crate::squash::{self, SquashError};

pub use report::{format_decision, format_preview};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Squash(#[from] SquashError),
    #[error(transparent)]
    DragSpec(#[from] DragSpecError),
    #[error("{0}")]
    User(String),
}

pub struct App<E: Editor> {
    editor: E,
}

impl<E: Editor> App<E> {
    pub fn new(editor: E) -> Self {
        Self { editor }
    }

    pub fn run(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Todo(opts) => self.handle_todo(opts),
            Command::Preview(opts) => self.handle_preview(opts),
            Command::Classify(opts) => self.handle_classify(opts),
            Command::Squash(opts) => self.handle_squash(opts),
        }
    }

    fn handle_todo(&mut self, opts: SnapshotArgs) -> Result<(), AppError> {
        let snapshot = load_snapshot(&opts.snapshot)?;
        let plan = RebasePlan::new(snapshot.commits)?;
        println!("{}", plan.to_todo());
        println!();
        for line in TODO_HELP.lines() {
            println!("# {}", line);
        }
        Ok(())
    }

    fn handle_preview(&mut self, opts: PreviewArgs) -> Result<(), AppError> {
        let snapshot = load_snapshot(&opts.snapshot.snapshot)?;
        let mut plan = load_plan(snapshot, opts.todo.as_deref())?;

        if opts.edit {
            let edited = self.editor.edit(&plan.to_todo(), TODO_HELP)?;
            plan = plan.apply_todo(&edited)?;
        }

        let projected = preview::project(&plan);
        if opts.json {
            println!("{}", serde_json::to_string_pretty(&projected)?);
        } else {
            print!("{}", format_preview(&plan, &projected));
        }
        Ok(())
    }

    fn handle_classify(&mut self, opts: ClassifyArgs) -> Result<(), AppError> {
        let snapshot = load_snapshot(&opts.snapshot.snapshot)?;
        let source = opts.source.resolve(&snapshot)?;
        let target = opts.target.resolve(&snapshot)?;

        let decision = drag::classify(&source, &target, &snapshot.active_branch);
        debug!("Classified drag as {}", decision.operation);

        if opts.json {
            println!("{}", serde_json::to_string_pretty(&decision)?);
        } else {
            print!("{}", format_decision(&decision));
        }
        Ok(())
    }

    fn handle_squash(&mut self, opts: SquashArgs) -> Result<(), AppError> {
        let snapshot = load_snapshot(&opts.snapshot.snapshot)?;
        let plan = load_plan(snapshot, Some(opts.todo.as_path()))?;

        let groups = plan.fold_groups();
        let group = groups.get(opts.group).ok_or_else(|| {
            AppError::User(format!(
                "No fold group {} (the todo list has {})",
                opts.group,
                groups.len()
            ))
        })?;

        let message = if opts.edit {
            let composed = squash::compose(&squash::group_entries(&plan, group));
            self.editor.edit(&composed, "")?
        } else {
            squash::final_message(&plan, group)?
        };
        println!("{}", message);
        Ok(())
    }
}

pub fn load_snapshot(path: &Path) -> Result<RepoSnapshot, AppError> {
    let json = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: RepoSnapshot =
        serde_json::from_str(&json).map_err(|source| AppError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "Loaded {} commits, {} branches (on {})",
        snapshot.commits.len(),
        snapshot.branches.len(),
        snapshot.active_branch
    );
    Ok(snapshot)
}

fn load_plan(snapshot: RepoSnapshot, todo: Option<&Path>) -> Result<RebasePlan, AppError> {
    let plan = RebasePlan::new(snapshot.commits)?;
    let Some(path) = todo else {
        return Ok(plan);
    };
    let text = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(plan.apply_todo(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_snapshot_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            load_snapshot(file.path()),
            Err(AppError::Snapshot { .. })
        ));
    }

    #[test]
    fn load_snapshot_reports_missing_file() {
        assert!(matches!(
            load_snapshot(Path::new("/nonexistent/snapshot.json")),
            Err(AppError::Io { .. })
        ));
    }
}
