//! Shared test utilities for creating test fixtures.
//!
//! This module provides helper functions for creating test data
//! used across multiple test modules.

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{TimeZone, Utc};

use crate::action::Action;
use crate::execution::{ApplyStep, RunnerError, StepOutcome, StepRunner};
use crate::models::CommitRef;
use crate::plan::RebasePlan;
use crate::utils::short_sha;

/// Create a test commit; the short id is the truncated id
pub fn make_commit(id: &str, message: &str) -> CommitRef {
    CommitRef {
        id: id.to_string(),
        short_id: short_sha(id).to_string(),
        message: message.to_string(),
        author_name: "Test User".to_string(),
        author_email: "test@example.com".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        parents: vec![],
        refs: vec![],
    }
}

/// Create a plan over commits with the given ids, messages "Commit <id>"
pub fn make_plan(ids: &[&str]) -> RebasePlan {
    let commits = ids
        .iter()
        .map(|id| make_commit(id, &format!("Commit {}", id)))
        .collect();
    RebasePlan::new(commits).unwrap()
}

pub fn plan_actions(plan: &RebasePlan) -> Vec<Action> {
    plan.entries().iter().map(|e| e.action).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Apply(String),
    CommitResolved(String),
    Discard(String),
    Restore,
}

/// Fake collaborator: replays scripted outcomes (then succeeds) and records every call.
pub struct ScriptedRunner {
    outcomes: RefCell<VecDeque<StepOutcome>>,
    calls: RefCell<Vec<RunnerCall>>,
    fail_discard: bool,
}

impl ScriptedRunner {
    pub fn new(outcomes: Vec<StepOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            calls: RefCell::new(Vec::new()),
            fail_discard: false,
        }
    }

    pub fn failing_discard(mut self) -> Self {
        self.fail_discard = true;
        self
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.borrow().clone()
    }
}

impl StepRunner for ScriptedRunner {
    fn apply(&self, step: &ApplyStep) -> StepOutcome {
        self.calls
            .borrow_mut()
            .push(RunnerCall::Apply(step.target_commit_id.clone()));
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(StepOutcome::Success)
    }

    fn commit_resolved(&self, step: &ApplyStep) -> Result<(), RunnerError> {
        self.calls
            .borrow_mut()
            .push(RunnerCall::CommitResolved(step.target_commit_id.clone()));
        Ok(())
    }

    fn discard(&self, step: &ApplyStep) -> Result<(), RunnerError> {
        self.calls
            .borrow_mut()
            .push(RunnerCall::Discard(step.target_commit_id.clone()));
        if self.fail_discard {
            return Err(RunnerError("cannot reset working tree".to_string()));
        }
        Ok(())
    }

    fn restore(&self) -> Result<(), RunnerError> {
        self.calls.borrow_mut().push(RunnerCall::Restore);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_commit() {
        let commit = make_commit("abc123def456", "Test message");
        assert_eq!(commit.id, "abc123def456");
        assert_eq!(commit.short_id, "abc123de");
        assert_eq!(commit.subject(), "Test message");
    }

    #[test]
    fn test_make_plan() {
        let plan = make_plan(&["a", "b"]);
        assert_eq!(plan_actions(&plan), vec![Action::Pick, Action::Pick]);
    }
}
