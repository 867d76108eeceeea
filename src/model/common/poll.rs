use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::Principal;

/// Our poll IDs are integers, allocated per scope starting from zero.
pub type PollId = u64;
/// Our poll options are free-form labels.
pub type OptionLabel = String;

/// Who owns a poll, and therefore who may vote in it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollScope {
    /// Run by the root authority, open to every non-party principal.
    Global,
    /// Run by a party, open only to its accepted members.
    Local(Principal),
}

impl Display for PollScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local(party) => write!(f, "local to {party}"),
        }
    }
}

/// Derived status of a poll at a given instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// The deadline has not yet passed.
    Open,
    /// The deadline has passed; results are final.
    Closed,
}
