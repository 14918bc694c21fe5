use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as seen in the repository snapshot handed over by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub id: String,
    pub short_id: String,
    /// Full commit message (first line + body)
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub parents: Vec<String>,
    /// Branch and tag names pointing at this commit
    #[serde(default)]
    pub refs: Vec<String>,
}

impl CommitRef {
    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Whether `id` names this commit: its short id, or any prefix of the full id.
    ///
    /// A prefix may match other commits too; lookups check for ambiguity.
    pub fn matches_id(&self, id: &str) -> bool {
        !id.is_empty() && (self.id.starts_with(id) || self.short_id == id)
    }
}

/// A branch descriptor from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
    /// Id of the commit the branch currently points at
    pub commit_id: String,
    /// True for remote-tracking branches (e.g. `origin/main`) with no local counterpart
    #[serde(default)]
    pub is_remote: bool,
}

impl BranchRef {
    pub fn local(name: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_id: commit_id.into(),
            is_remote: false,
        }
    }

    pub fn remote(name: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_id: commit_id.into(),
            is_remote: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub commit_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitLookupError {
    #[error("No commit '{0}' in the snapshot")]
    Unknown(String),
    #[error("'{0}' matches more than one commit")]
    Ambiguous(String),
}

/// Everything the core needs to know about the repository, supplied before a
/// rebase session starts and before every classifier call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// Commits in the selected range, oldest first
    pub commits: Vec<CommitRef>,
    #[serde(default)]
    pub branches: Vec<BranchRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub active_branch: String,
}

impl RepoSnapshot {
    /// The one commit `id` names.
    pub fn find_commit(&self, id: &str) -> Result<&CommitRef, CommitLookupError> {
        let mut matches = self.commits.iter().filter(|c| c.matches_id(id));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit),
            (Some(_), Some(_)) => Err(CommitLookupError::Ambiguous(id.to_string())),
            (None, _) => Err(CommitLookupError::Unknown(id.to_string())),
        }
    }

    pub fn find_branch(&self, name: &str) -> Option<&BranchRef> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn find_tag(&self, name: &str) -> Option<&TagRef> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Name of the branch a commit belongs to, for lane-based reordering.
    ///
    /// Prefers a branch pointing directly at the commit, then the active branch.
    pub fn branch_of(&self, commit: &CommitRef) -> String {
        self.branches
            .iter()
            .filter(|b| !b.is_remote)
            .find(|b| b.commit_id == commit.id || commit.refs.contains(&b.name))
            .map(|b| b.name.clone())
            .unwrap_or_else(|| self.active_branch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_commit;

    #[test]
    fn subject_is_first_line() {
        let mut commit = make_commit("abc123", "Add parser");
        commit.message = "Add parser\n\nLonger body here".to_string();
        assert_eq!(commit.subject(), "Add parser");
    }

    #[test]
    fn matches_id_by_prefix_or_short() {
        let commit = make_commit("abc123def", "msg");
        assert!(commit.matches_id("abc1"));
        assert!(commit.matches_id(&commit.short_id));
        assert!(!commit.matches_id("def"));
        assert!(!commit.matches_id(""));
    }

    #[test]
    fn snapshot_deserializes_with_defaults() {
        let json = r#"{
            "commits": [{
                "id": "abc123", "short_id": "abc", "message": "Init",
                "author_name": "A", "author_email": "a@example.com",
                "timestamp": "2024-01-01T00:00:00Z"
            }],
            "active_branch": "main"
        }"#;
        let snapshot: RepoSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.commits.len(), 1);
        assert!(snapshot.commits[0].parents.is_empty());
        assert!(snapshot.branches.is_empty());
        assert_eq!(snapshot.find_commit("abc").unwrap().id, "abc123");
    }

    #[test]
    fn find_commit_rejects_ambiguous_prefix() {
        let snapshot = RepoSnapshot {
            commits: vec![make_commit("abc123", "one"), make_commit("abd456", "two")],
            active_branch: "main".to_string(),
            ..RepoSnapshot::default()
        };
        assert_eq!(snapshot.find_commit("abd").unwrap().message, "two");
        assert_eq!(
            snapshot.find_commit("ab"),
            Err(CommitLookupError::Ambiguous("ab".to_string()))
        );
        assert_eq!(
            snapshot.find_commit("fff"),
            Err(CommitLookupError::Unknown("fff".to_string()))
        );
    }

    #[test]
    fn branch_of_prefers_pointing_branch() {
        let commit = make_commit("abc123", "msg");
        let snapshot = RepoSnapshot {
            commits: vec![commit.clone()],
            branches: vec![
                BranchRef::remote("origin/feature", "abc123"),
                BranchRef::local("feature", "abc123"),
            ],
            tags: vec![],
            active_branch: "main".to_string(),
        };
        assert_eq!(snapshot.branch_of(&commit), "feature");

        let other = make_commit("fff000", "other");
        assert_eq!(snapshot.branch_of(&other), "main");
    }
}
