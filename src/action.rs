use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to a commit when the plan is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Keep the commit as-is
    #[default]
    Pick,
    /// Keep the commit, but edit its message
    Reword,
    /// Keep the commit, and stop after applying it for amending
    Edit,
    /// Meld into the fold target, keeping this commit's message
    Squash,
    /// Meld into the fold target, discarding this commit's message
    Fixup,
    /// Remove the commit from the rewritten history
    Drop,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Pick,
        Action::Reword,
        Action::Edit,
        Action::Squash,
        Action::Fixup,
        Action::Drop,
    ];

    /// True for actions that meld into a preceding commit.
    pub fn is_fold(self) -> bool {
        matches!(self, Action::Squash | Action::Fixup)
    }

    /// True for actions that produce a commit of their own in the new history.
    pub fn survives(self) -> bool {
        match self {
            Action::Pick | Action::Reword | Action::Edit => true,
            Action::Squash | Action::Fixup | Action::Drop => false,
        }
    }

    /// Todo-list keyword
    pub fn keyword(self) -> &'static str {
        match self {
            Action::Pick => "pick",
            Action::Reword => "reword",
            Action::Edit => "edit",
            Action::Squash => "squash",
            Action::Fixup => "fixup",
            Action::Drop => "drop",
        }
    }

    /// One-letter todo-list abbreviation
    pub fn abbreviation(self) -> char {
        match self {
            Action::Pick => 'p',
            Action::Reword => 'r',
            Action::Edit => 'e',
            Action::Squash => 's',
            Action::Fixup => 'f',
            Action::Drop => 'd',
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| {
                a.keyword() == lowered || (lowered.len() == 1 && lowered.starts_with(a.abbreviation()))
            })
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords_and_abbreviations() {
        assert_eq!("squash".parse::<Action>().unwrap(), Action::Squash);
        assert_eq!("F".parse::<Action>().unwrap(), Action::Fixup);
        assert_eq!(" d ".parse::<Action>().unwrap(), Action::Drop);
        assert!("x".parse::<Action>().is_err());
        assert!("picky".parse::<Action>().is_err());
    }

    #[test]
    fn fold_and_survive_are_disjoint() {
        for action in Action::ALL {
            assert!(!(action.is_fold() && action.survives()), "{}", action);
        }
        assert!(!Action::Drop.is_fold());
        assert!(!Action::Drop.survives());
    }

    #[test]
    fn display_matches_keyword() {
        assert_eq!(Action::Reword.to_string(), "reword");
        assert_eq!(Action::default(), Action::Pick);
    }
}
