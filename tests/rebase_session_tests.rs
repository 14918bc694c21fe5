//! End-to-end rebase runs driven through a recording collaborator

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{TimeZone, Utc};

use git_replan::action::Action;
use git_replan::execution::{
    ApplyStep, ExecutionController, ExecutionError, ExecutionStatus, PauseReason, RebaseSession,
    RunnerError, StepKind, StepOutcome, StepRunner,
};
use git_replan::models::CommitRef;
use git_replan::plan::RebasePlan;

fn commit(id: &str, message: &str) -> CommitRef {
    CommitRef {
        id: id.to_string(),
        short_id: id.to_string(),
        message: message.to_string(),
        author_name: "Test User".to_string(),
        author_email: "test@example.com".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        parents: vec![],
        refs: vec![],
    }
}

fn plan(ids: &[&str]) -> RebasePlan {
    RebasePlan::new(
        ids.iter()
            .map(|id| commit(id, &format!("Subject {}", id)))
            .collect(),
    )
    .expect("non-empty plan")
}

/// Replays scripted outcomes, succeeding once the script runs out, and logs every call.
#[derive(Default)]
struct RecordingRunner {
    outcomes: RefCell<VecDeque<StepOutcome>>,
    applied: RefCell<Vec<ApplyStep>>,
    log: RefCell<Vec<String>>,
}

impl RecordingRunner {
    fn scripted(outcomes: Vec<StepOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            ..Self::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn applied(&self) -> Vec<ApplyStep> {
        self.applied.borrow().clone()
    }
}

impl StepRunner for RecordingRunner {
    fn apply(&self, step: &ApplyStep) -> StepOutcome {
        self.log
            .borrow_mut()
            .push(format!("apply {}", step.target_commit_id));
        self.applied.borrow_mut().push(step.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(StepOutcome::Success)
    }

    fn commit_resolved(&self, step: &ApplyStep) -> Result<(), RunnerError> {
        self.log
            .borrow_mut()
            .push(format!("commit {}", step.target_commit_id));
        Ok(())
    }

    fn discard(&self, step: &ApplyStep) -> Result<(), RunnerError> {
        self.log
            .borrow_mut()
            .push(format!("discard {}", step.target_commit_id));
        Ok(())
    }

    fn restore(&self) -> Result<(), RunnerError> {
        self.log.borrow_mut().push("restore".to_string());
        Ok(())
    }
}

fn conflict_on(file: &str) -> StepOutcome {
    StepOutcome::Conflict {
        files: vec![file.to_string()],
    }
}

#[test]
fn test_conflict_resolve_and_continue() {
    let runner = RecordingRunner::scripted(vec![StepOutcome::Success, conflict_on("x.txt")]);
    let mut session = RebaseSession::new(&runner);

    assert_eq!(
        session.start(&plan(&["c1", "c2", "c3"])).unwrap(),
        ExecutionStatus::Paused
    );
    let conflict = session.controller().conflict().expect("conflict recorded");
    assert_eq!(conflict.commit_id, "c2");
    assert_eq!(session.controller().unresolved_files(), vec!["x.txt"]);

    // Continue is refused while x.txt is unresolved
    assert!(matches!(
        session.continue_run(),
        Err(ExecutionError::UnresolvedConflicts(files)) if files == vec!["x.txt".to_string()]
    ));
    assert_eq!(session.status(), ExecutionStatus::Paused);

    session.resolve_file("x.txt").unwrap();
    assert_eq!(session.continue_run().unwrap(), ExecutionStatus::Completed);

    let progress = session.controller().progress();
    assert_eq!(progress.completed_ids.len(), 3);
    assert!(progress.skipped_ids.is_empty());
    assert_eq!(
        runner.log(),
        vec!["apply c1", "apply c2", "commit c2", "apply c3"]
    );
}

#[test]
fn test_resolving_unknown_file_is_rejected() {
    let runner = RecordingRunner::scripted(vec![conflict_on("x.txt")]);
    let mut session = RebaseSession::new(&runner);
    session.start(&plan(&["c1", "c2"])).unwrap();

    assert!(matches!(
        session.resolve_file("y.txt"),
        Err(ExecutionError::UnknownConflictFile(_))
    ));
    assert_eq!(session.status(), ExecutionStatus::Paused);
}

#[test]
fn test_skip_records_skipped_commit() {
    let runner = RecordingRunner::scripted(vec![conflict_on("a.rs")]);
    let mut session = RebaseSession::new(&runner);
    session.start(&plan(&["c1", "c2"])).unwrap();

    assert_eq!(session.skip().unwrap(), ExecutionStatus::Completed);
    let progress = session.controller().progress();
    assert!(progress.skipped_ids.contains("c1"));
    assert!(progress.completed_ids.contains("c2"));
    assert_eq!(runner.log(), vec!["apply c1", "discard c1", "apply c2"]);
}

#[test]
fn test_abort_while_paused_restores() {
    let runner = RecordingRunner::scripted(vec![StepOutcome::Success, conflict_on("x.txt")]);
    let mut session = RebaseSession::new(&runner);
    session.start(&plan(&["c1", "c2", "c3"])).unwrap();

    assert_eq!(session.abort().unwrap(), ExecutionStatus::Aborted);
    assert!(session.status().is_terminal());
    assert_eq!(runner.log().last().map(String::as_str), Some("restore"));

    // Terminal: nothing else is accepted
    assert!(matches!(
        session.continue_run(),
        Err(ExecutionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.abort(),
        Err(ExecutionError::InvalidTransition { .. })
    ));
}

#[test]
fn test_squash_run_becomes_one_meld_step() {
    let base = plan(&["A", "B", "C", "D"])
        .set_action(1, Action::Squash)
        .set_action(2, Action::Fixup);
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);

    assert_eq!(session.start(&base).unwrap(), ExecutionStatus::Completed);

    let applied = runner.applied();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].kind, StepKind::Meld);
    assert_eq!(applied[0].target_commit_id, "A");
    assert_eq!(applied[0].folded_commit_ids, vec!["B", "C"]);
    assert_eq!(
        applied[0].new_message.as_deref(),
        Some("Subject A\n\nSubject B")
    );
    assert_eq!(applied[1].kind, StepKind::Pick);
    assert_eq!(applied[1].target_commit_id, "D");
}

#[test]
fn test_reword_and_drop_steps() {
    let base = plan(&["A", "B", "C"])
        .set_action(0, Action::Reword)
        .set_message(0, Some("Better subject".to_string()))
        .set_action(1, Action::Drop);
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);
    session.start(&base).unwrap();

    let applied = runner.applied();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].kind, StepKind::Reword);
    assert_eq!(applied[0].new_message.as_deref(), Some("Better subject"));
    assert_eq!(applied[1].target_commit_id, "C");
}

#[test]
fn test_fatal_failure_aborts_and_restores() {
    let runner = RecordingRunner::scripted(vec![StepOutcome::Failed {
        message: "index.lock exists".to_string(),
    }]);
    let mut session = RebaseSession::new(&runner);

    let err = session.start(&plan(&["c1", "c2"])).unwrap_err();
    assert!(matches!(err, ExecutionError::StepFailed { ref message, .. } if message == "index.lock exists"));
    assert_eq!(session.status(), ExecutionStatus::Aborted);
    assert_eq!(runner.log(), vec!["apply c1", "restore"]);
}

#[test]
fn test_paused_run_survives_persistence() {
    let runner = RecordingRunner::scripted(vec![conflict_on("x.txt")]);
    let mut session = RebaseSession::new(&runner);
    session.start(&plan(&["c1", "c2"])).unwrap();

    let saved = serde_json::to_string(&session.into_controller()).unwrap();

    let controller: ExecutionController = serde_json::from_str(&saved).unwrap();
    assert_eq!(controller.status(), ExecutionStatus::Paused);

    let mut resumed = RebaseSession::resume(&runner, controller);
    resumed.resolve_file("x.txt").unwrap();
    assert_eq!(resumed.continue_run().unwrap(), ExecutionStatus::Completed);
    assert_eq!(
        runner.log(),
        vec!["apply c1", "commit c1", "apply c2"]
    );
}

#[test]
fn test_start_twice_is_rejected() {
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);
    let base = plan(&["c1"]);
    session.start(&base).unwrap();

    assert!(matches!(
        session.start(&base),
        Err(ExecutionError::InvalidTransition { .. })
    ));
}

#[test]
fn test_edit_stops_for_amending_then_continues() {
    let base = plan(&["c1", "c2", "c3"]).set_action(1, Action::Edit);
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);

    assert_eq!(session.start(&base).unwrap(), ExecutionStatus::Paused);
    assert!(!session.status().is_terminal());
    assert_eq!(
        session.controller().pause_reason(),
        Some(PauseReason::Edit)
    );
    assert_eq!(runner.log(), vec!["apply c1", "apply c2"]);

    assert_eq!(session.continue_run().unwrap(), ExecutionStatus::Completed);
    assert_eq!(
        runner.log(),
        vec!["apply c1", "apply c2", "commit c2", "apply c3"]
    );
    assert_eq!(session.controller().progress().completed_ids.len(), 3);
}

#[test]
fn test_meld_progress_covers_folded_commits() {
    let base = plan(&["A", "B", "C", "D"])
        .set_action(1, Action::Squash)
        .set_action(2, Action::Fixup);
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);
    session.start(&base).unwrap();

    let completed = &session.controller().progress().completed_ids;
    assert_eq!(completed.len(), 4);
    assert!(completed.contains("B") && completed.contains("C"));
}

#[test]
fn test_picked_commit_with_edited_message_is_reworded() {
    let base = plan(&["A", "B"]).set_message(1, Some("New subject\n# why".to_string()));
    let runner = RecordingRunner::default();
    let mut session = RebaseSession::new(&runner);
    session.start(&base).unwrap();

    let applied = runner.applied();
    assert_eq!(applied[1].kind, StepKind::Reword);
    assert_eq!(applied[1].new_message.as_deref(), Some("New subject"));
}
