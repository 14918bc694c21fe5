use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{
    build_steps, ApplyStep, ConflictState, ExecutionError, ExecutionProgress, ExecutionStatus,
    PauseReason, StepKind, StepOutcome,
};
use crate::plan::RebasePlan;
use crate::utils::short_sha;

/// What the caller has to do after feeding an event to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Hand this step to the collaborator and report its outcome
    Apply(ApplyStep),
    /// Waiting on the user: after a conflict resolve files, then continue, skip
    /// or abort; after an edit stop amend, then continue or abort
    Paused,
    Completed,
    /// The run was aborted; the collaborator must restore the pre-rebase state
    Restore,
}

/// The rebase state machine.
///
/// It is a plain value: serialize it while paused and deserialize it later to
/// pick up exactly where the run stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionController {
    steps: Vec<ApplyStep>,
    progress: ExecutionProgress,
    conflict: Option<ConflictState>,
    #[serde(default)]
    pause: Option<PauseReason>,
}

impl ExecutionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.progress.status
    }

    pub fn progress(&self) -> &ExecutionProgress {
        &self.progress
    }

    pub fn conflict(&self) -> Option<&ConflictState> {
        self.conflict.as_ref()
    }

    /// Why the run is paused, if it is.
    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.pause
    }

    pub fn steps(&self) -> &[ApplyStep] {
        &self.steps
    }

    /// The step in flight, or the one a pause is holding.
    pub fn current_step(&self) -> Option<&ApplyStep> {
        match self.status() {
            ExecutionStatus::Running | ExecutionStatus::Paused => {
                self.steps.get(self.progress.current_index)
            }
            _ => None,
        }
    }

    /// idle -> running. Returns the first step, or `Completed` when nothing survives.
    pub fn start(&mut self, plan: &RebasePlan) -> Result<Next, ExecutionError> {
        self.expect(&[ExecutionStatus::Idle], "start")?;

        let steps = build_steps(plan)?;
        info!(
            "Starting rebase: {} steps from {} commits",
            steps.len(),
            plan.len()
        );
        self.progress = ExecutionProgress {
            total: steps.len(),
            status: ExecutionStatus::Running,
            ..ExecutionProgress::default()
        };
        self.steps = steps;
        self.conflict = None;
        self.pause = None;

        Ok(self.advance())
    }

    /// Feed back the outcome of the step in flight.
    pub fn report(&mut self, outcome: StepOutcome) -> Result<Next, ExecutionError> {
        self.expect(&[ExecutionStatus::Running], "report a step outcome")?;
        let Some(step) = self.steps.get(self.progress.current_index) else {
            return Err(ExecutionError::InvalidTransition {
                event: "report a step outcome",
                status: self.status(),
            });
        };
        let commit_id = step.target_commit_id.clone();
        let stops_for_edit = step.kind == StepKind::Edit;

        match outcome {
            StepOutcome::Success if stops_for_edit => {
                info!("Applied {}; stopped for amending", short_sha(&commit_id));
                self.pause = Some(PauseReason::Edit);
                self.progress.status = ExecutionStatus::Paused;
                Ok(Next::Paused)
            }
            StepOutcome::Success => {
                debug!("Applied {}", short_sha(&commit_id));
                self.finish_current(false);
                Ok(self.advance())
            }
            StepOutcome::Conflict { files } => {
                warn!(
                    "Conflict applying {} ({} files); paused",
                    short_sha(&commit_id),
                    files.len()
                );
                self.conflict = Some(ConflictState::new(commit_id, files));
                self.pause = Some(PauseReason::Conflict);
                self.progress.status = ExecutionStatus::Paused;
                Ok(Next::Paused)
            }
            StepOutcome::Failed { message } => {
                warn!("Applying {} failed: {}", short_sha(&commit_id), message);
                Ok(self.discard_run())
            }
        }
    }

    /// Mark one conflicted file resolved. Does not change the state.
    pub fn resolve_file(&mut self, path: &str) -> Result<(), ExecutionError> {
        self.expect(&[ExecutionStatus::Paused], "resolve a file")?;
        let file = self
            .conflict
            .as_mut()
            .and_then(|c| c.conflicted_files.iter_mut().find(|f| f.path == path))
            .ok_or_else(|| ExecutionError::UnknownConflictFile(path.to_string()))?;
        file.resolved = true;
        Ok(())
    }

    /// Files still blocking `continue_run`.
    pub fn unresolved_files(&self) -> Vec<String> {
        self.conflict
            .as_ref()
            .map(ConflictState::unresolved)
            .unwrap_or_default()
    }

    /// paused -> running, once every conflicted file is resolved. The paused
    /// step counts as applied; the next step is returned.
    pub fn continue_run(&mut self) -> Result<Next, ExecutionError> {
        self.expect(&[ExecutionStatus::Paused], "continue")?;
        let unresolved = self.unresolved_files();
        if !unresolved.is_empty() {
            return Err(ExecutionError::UnresolvedConflicts(unresolved));
        }

        if let Some(step) = self.current_step() {
            info!("Continuing after {}", short_sha(&step.target_commit_id));
        }
        self.finish_current(false);
        self.progress.status = ExecutionStatus::Running;
        Ok(self.advance())
    }

    /// paused -> running, leaving the conflicted step out of this run.
    ///
    /// An edit stop has already applied its commit, so there is nothing to skip.
    pub fn skip(&mut self) -> Result<Next, ExecutionError> {
        self.expect(&[ExecutionStatus::Paused], "skip")?;
        if self.pause == Some(PauseReason::Edit) {
            return Err(ExecutionError::InvalidTransition {
                event: "skip an edit stop",
                status: self.status(),
            });
        }
        if let Some(step) = self.current_step() {
            info!("Skipping {}", short_sha(&step.target_commit_id));
        }
        self.finish_current(true);
        self.progress.status = ExecutionStatus::Running;
        Ok(self.advance())
    }

    /// running | paused -> aborted.
    pub fn abort(&mut self) -> Result<Next, ExecutionError> {
        self.expect(&[ExecutionStatus::Running, ExecutionStatus::Paused], "abort")?;
        info!("Aborting rebase");
        Ok(self.discard_run())
    }

    fn advance(&mut self) -> Next {
        match self.steps.get(self.progress.current_index) {
            Some(step) => {
                info!(
                    "Applying step {}/{}: {:?} {}",
                    self.progress.current_index + 1,
                    self.progress.total,
                    step.kind,
                    short_sha(&step.target_commit_id)
                );
                Next::Apply(step.clone())
            }
            None => {
                info!(
                    "Rebase complete: {} applied, {} skipped",
                    self.progress.completed_ids.len(),
                    self.progress.skipped_ids.len()
                );
                self.progress.status = ExecutionStatus::Completed;
                Next::Completed
            }
        }
    }

    /// Record the current step's commits, folded ones included, and move past it.
    fn finish_current(&mut self, skipped: bool) {
        self.conflict = None;
        self.pause = None;
        if let Some(step) = self.steps.get(self.progress.current_index) {
            let ids = std::iter::once(&step.target_commit_id)
                .chain(&step.folded_commit_ids)
                .cloned();
            if skipped {
                self.progress.skipped_ids.extend(ids);
            } else {
                self.progress.completed_ids.extend(ids);
            }
        }
        self.progress.current_index += 1;
    }

    fn discard_run(&mut self) -> Next {
        self.steps.clear();
        self.conflict = None;
        self.pause = None;
        self.progress = ExecutionProgress {
            status: ExecutionStatus::Aborted,
            ..ExecutionProgress::default()
        };
        Next::Restore
    }

    fn expect(
        &self,
        allowed: &[ExecutionStatus],
        event: &'static str,
    ) -> Result<(), ExecutionError> {
        if allowed.contains(&self.status()) {
            Ok(())
        } else {
            Err(ExecutionError::InvalidTransition {
                event,
                status: self.status(),
            })
        }
    }
}
