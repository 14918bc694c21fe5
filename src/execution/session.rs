use log::{info, warn};

use super::{
    ApplyStep, ExecutionController, ExecutionError, ExecutionStatus, Next, PauseReason,
    StepOutcome,
};
use crate::plan::RebasePlan;
use crate::utils::short_sha;

/// Failure reported by the collaborator outside of a step outcome.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RunnerError(pub String);

/// The external collaborator that actually mutates the repository.
pub trait StepRunner {
    /// Apply one step and report how it went.
    fn apply(&self, step: &ApplyStep) -> StepOutcome;

    /// Record the user's conflict resolution, or amendments at an edit stop,
    /// for `step` before the run continues.
    fn commit_resolved(&self, _step: &ApplyStep) -> Result<(), RunnerError> {
        Ok(())
    }

    /// Throw away the partially applied changes of `step`.
    fn discard(&self, step: &ApplyStep) -> Result<(), RunnerError>;

    /// Put the repository back exactly as it was before the run started.
    fn restore(&self) -> Result<(), RunnerError>;
}

/// Drives an `ExecutionController` against a `StepRunner`, one step at a time,
/// stopping at the first pause or terminal state.
pub struct RebaseSession<'a, R: StepRunner> {
    runner: &'a R,
    controller: ExecutionController,
}

impl<'a, R: StepRunner> RebaseSession<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self::resume(runner, ExecutionController::new())
    }

    /// Pick up a previously persisted controller.
    pub fn resume(runner: &'a R, controller: ExecutionController) -> Self {
        Self { runner, controller }
    }

    pub fn controller(&self) -> &ExecutionController {
        &self.controller
    }

    pub fn into_controller(self) -> ExecutionController {
        self.controller
    }

    pub fn status(&self) -> ExecutionStatus {
        self.controller.status()
    }

    pub fn start(&mut self, plan: &RebasePlan) -> Result<ExecutionStatus, ExecutionError> {
        let next = self.controller.start(plan)?;
        self.drive(next)
    }

    pub fn resolve_file(&mut self, path: &str) -> Result<(), ExecutionError> {
        self.controller.resolve_file(path)
    }

    /// Continue after every conflicted file is resolved, or after amending.
    pub fn continue_run(&mut self) -> Result<ExecutionStatus, ExecutionError> {
        let unresolved = self.controller.unresolved_files();
        if !unresolved.is_empty() {
            return Err(ExecutionError::UnresolvedConflicts(unresolved));
        }
        if let Some(step) = self.paused_step() {
            if let Err(err) = self.runner.commit_resolved(&step) {
                return self.fail(err.into());
            }
        }
        let next = self.controller.continue_run()?;
        self.drive(next)
    }

    pub fn skip(&mut self) -> Result<ExecutionStatus, ExecutionError> {
        let conflicted = match self.controller.pause_reason() {
            Some(PauseReason::Conflict) => self.paused_step(),
            Some(PauseReason::Edit) | None => None,
        };
        if let Some(step) = conflicted {
            if let Err(err) = self.runner.discard(&step) {
                return self.fail(err.into());
            }
        }
        let next = self.controller.skip()?;
        self.drive(next)
    }

    pub fn abort(&mut self) -> Result<ExecutionStatus, ExecutionError> {
        let next = self.controller.abort()?;
        self.drive(next)
    }

    fn paused_step(&self) -> Option<ApplyStep> {
        if self.controller.status() != ExecutionStatus::Paused {
            return None;
        }
        self.controller.current_step().cloned()
    }

    fn drive(&mut self, mut next: Next) -> Result<ExecutionStatus, ExecutionError> {
        loop {
            next = match next {
                Next::Apply(step) => match self.runner.apply(&step) {
                    StepOutcome::Failed { message } => {
                        self.controller
                            .report(StepOutcome::Failed {
                                message: message.clone(),
                            })?;
                        self.runner.restore()?;
                        return Err(ExecutionError::StepFailed {
                            commit: short_sha(&step.target_commit_id).to_string(),
                            message,
                        });
                    }
                    outcome => self.controller.report(outcome)?,
                },
                Next::Paused => return Ok(ExecutionStatus::Paused),
                Next::Completed => return Ok(ExecutionStatus::Completed),
                Next::Restore => {
                    self.runner.restore()?;
                    info!("Repository restored to its pre-rebase state");
                    return Ok(ExecutionStatus::Aborted);
                }
            };
        }
    }

    /// A collaborator error outside a step: abort the run and surface the error.
    fn fail(&mut self, err: ExecutionError) -> Result<ExecutionStatus, ExecutionError> {
        warn!("{}; aborting", err);
        self.controller.abort()?;
        self.runner.restore()?;
        Err(err)
    }
}
