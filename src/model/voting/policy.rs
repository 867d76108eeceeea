use serde::{Deserialize, Serialize};

use super::poll::Poll;

/// Decides which submitted option labels may be tallied.
///
/// This is the only place ballot labels are validated; swapping the policy
/// changes nothing else about vote casting.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionPolicy {
    /// Tally whatever label is submitted, declared or not.
    #[default]
    Permissive,
    /// Tally only labels that appear in the poll's declared options.
    DeclaredOnly,
}

impl OptionPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::DeclaredOnly
        } else {
            Self::Permissive
        }
    }

    pub fn permits(self, poll: &Poll, option: &str) -> bool {
        match self {
            Self::Permissive => true,
            Self::DeclaredOnly => poll.options().iter().any(|declared| declared == option),
        }
    }
}
