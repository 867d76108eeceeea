use serde::{Deserialize, Serialize};

use crate::model::common::{OptionLabel, PollId};

/// Body of a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option: OptionLabel,
}


/// Returned when a poll is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPoll {
    pub id: PollId,
}
