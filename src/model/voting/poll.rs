use std::collections::{HashMap, HashSet};

use chrono::{serde::ts_seconds, DateTime, Duration, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{OptionLabel, PollId, PollScope, PollStatus, Principal};

/// Durations are clamped to this many seconds (roughly a millennium) so that
/// deadlines are always representable.
pub const MAX_POLL_DURATION_SECS: u64 = 1000 * 365 * 24 * 60 * 60;

/// The immutable definition of a poll, as supplied by its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    pub description: String,
    /// Option labels in display order. Duplicates are kept.
    pub options: Vec<OptionLabel>,
    /// Seconds from creation until the poll closes. Zero closes it immediately.
    pub duration: u64,
}

/// A poll and its running tally.
///
/// Only `has_voted` and `votes` change after creation, and both only grow.
#[derive(Debug, Clone)]
pub struct Poll {
    description: String,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    options: Vec<OptionLabel>,
    has_voted: HashSet<Principal>,
    votes: HashMap<OptionLabel, u64>,
}

impl Poll {
    /// Creation time and deadline are kept to whole seconds, as published.
    pub fn new(spec: PollSpec, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(0);
        let duration = spec.duration.min(MAX_POLL_DURATION_SECS);
        Self {
            description: spec.description,
            created_at: now,
            deadline: now + Duration::seconds(duration as i64),
            options: spec.options,
            has_voted: HashSet::new(),
            votes: HashMap::new(),
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn options(&self) -> &[OptionLabel] {
        &self.options
    }

    /// Open while `now` has not passed the deadline; the deadline itself is still open.
    pub fn status(&self, now: DateTime<Utc>) -> PollStatus {
        if now <= self.deadline {
            PollStatus::Open
        } else {
            PollStatus::Closed
        }
    }

    pub fn has_voted(&self, principal: &Principal) -> bool {
        self.has_voted.contains(principal)
    }

    pub fn tally(&self, option: &str) -> u64 {
        self.votes.get(option).copied().unwrap_or(0)
    }

    /// Record a ballot. Callers must have already checked eligibility.
    pub(super) fn record(&mut self, voter: Principal, option: OptionLabel) {
        self.has_voted.insert(voter);
        *self.votes.entry(option).or_insert(0) += 1;
    }

    /// Counts for each declared option, in first-appearance order without repeats.
    pub fn results(&self) -> Vec<OptionTally> {
        let mut seen = HashSet::new();
        self.options
            .iter()
            .filter(|option| seen.insert(option.as_str()))
            .map(|option| OptionTally {
                option: option.clone(),
                votes: self.tally(option),
            })
            .collect()
    }

    pub fn details(&self, id: PollId, scope: PollScope, now: DateTime<Utc>) -> PollDetails {
        PollDetails {
            id,
            scope,
            description: self.description.clone(),
            created_at: self.created_at,
            deadline: self.deadline,
            options: self.options.clone(),
            status: self.status(now),
        }
    }
}

/// The public view of a poll. Excludes who voted for what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDetails {
    pub id: PollId,
    pub scope: PollScope,
    pub description: String,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub deadline: DateTime<Utc>,
    pub options: Vec<OptionLabel>,
    pub status: PollStatus,
}

impl PollDetails {
    /// What a lookup of a poll that was never created returns: empty, with an
    /// unset deadline, and therefore closed.
    pub fn unknown(id: PollId, scope: PollScope) -> Self {
        let epoch = Utc.timestamp_opt(0, 0).unwrap(); // Valid timestamp.
        Self {
            id,
            scope,
            description: String::new(),
            created_at: epoch,
            deadline: epoch,
            options: Vec::new(),
            status: PollStatus::Closed,
        }
    }
}

/// Vote count for a single option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    pub option: OptionLabel,
    pub votes: u64,
}

/// All polls of one scope. A poll's ID is its creation index, so IDs start
/// at zero, increase by one, and are never reused.
#[derive(Debug, Default)]
pub struct PollBook {
    polls: Vec<Poll>,
}

impl PollBook {
    /// Store a new poll and return its ID.
    pub fn insert(&mut self, poll: Poll) -> PollId {
        let id = self.next_id();
        self.polls.push(poll);
        id
    }

    pub fn next_id(&self) -> PollId {
        self.polls.len() as PollId
    }

    pub fn get(&self, id: PollId) -> Option<&Poll> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.polls.get(index))
    }

    pub fn get_mut(&mut self, id: PollId) -> Option<&mut Poll> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.polls.get_mut(index))
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    /// IDs of the page `[offset, offset + limit)` of this book.
    pub fn ids(&self, offset: usize, limit: usize) -> Vec<PollId> {
        (0..self.polls.len())
            .skip(offset)
            .take(limit)
            .map(|index| index as PollId)
            .collect()
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PollSpec {
        pub fn budget_example() -> Self {
            Self {
                description: "Budget".to_string(),
                options: vec!["yes".to_string(), "no".to_string()],
                duration: 1000,
            }
        }

        pub fn short_example() -> Self {
            Self {
                description: "Quick question".to_string(),
                options: vec!["a".to_string(), "b".to_string(), "a".to_string()],
                duration: 1,
            }
        }
    }
}
