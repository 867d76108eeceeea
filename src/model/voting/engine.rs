use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{
    authority::{require_capability, Authority, Capability},
    common::{OptionLabel, PollId, PollScope, PollStatus, Principal},
    errors::{LedgerError, LedgerResult},
    pagination::Page,
    registry::MembershipRegistry,
};

use super::{
    policy::OptionPolicy,
    poll::{OptionTally, Poll, PollBook, PollDetails, PollSpec},
};

/// Owns every poll, global and local, and enforces who may vote in them and when.
#[derive(Debug, Default)]
pub struct VotingEngine {
    policy: OptionPolicy,
    global: PollBook,
    local: HashMap<Principal, PollBook>,
}

impl VotingEngine {
    pub fn new(policy: OptionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Create a poll owned by the root authority.
    pub fn create_global_poll(
        &mut self,
        authority: &dyn Authority,
        caller: &Principal,
        spec: PollSpec,
        now: DateTime<Utc>,
    ) -> LedgerResult<PollId> {
        require_capability(authority, caller, Capability::RootAuthority)?;
        Ok(self.global.insert(Poll::new(spec, now)))
    }

    /// Create a poll owned by the calling party.
    pub fn create_local_poll(
        &mut self,
        authority: &dyn Authority,
        party: &Principal,
        spec: PollSpec,
        now: DateTime<Utc>,
    ) -> LedgerResult<PollId> {
        require_capability(authority, party, Capability::Party)?;
        let book = self.local.entry(*party).or_default();
        Ok(book.insert(Poll::new(spec, now)))
    }

    /// Cast `voter`'s ballot in a global poll. Parties may not vote in global polls.
    pub fn cast_global_vote(
        &mut self,
        authority: &dyn Authority,
        voter: Principal,
        poll_id: PollId,
        option: OptionLabel,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let scope = PollScope::Global;
        let policy = self.policy;
        // An unknown poll has no deadline set, so it is already closed.
        let poll = self
            .global
            .get_mut(poll_id)
            .ok_or(LedgerError::PollClosed { scope, poll_id })?;
        check_open(poll, scope, poll_id, now)?;
        check_not_voted(poll, voter, scope, poll_id)?;
        if authority.has_capability(&voter, Capability::Party) {
            return Err(LedgerError::IneligibleVoter {
                voter,
                scope,
                poll_id,
            });
        }
        check_option(policy, poll, &option, scope, poll_id)?;

        poll.record(voter, option);
        Ok(())
    }

    /// Cast `voter`'s ballot in one of `party`'s polls. Only accepted members
    /// of the party, as of now, may vote.
    pub fn cast_local_vote(
        &mut self,
        registry: &MembershipRegistry,
        voter: Principal,
        party: Principal,
        poll_id: PollId,
        option: OptionLabel,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let scope = PollScope::Local(party);
        if !registry.is_active_member(&party, &voter) {
            return Err(LedgerError::IneligibleVoter {
                voter,
                scope,
                poll_id,
            });
        }
        let policy = self.policy;
        let poll = self
            .local
            .get_mut(&party)
            .and_then(|book| book.get_mut(poll_id))
            .ok_or(LedgerError::PollClosed { scope, poll_id })?;
        check_open(poll, scope, poll_id, now)?;
        check_not_voted(poll, voter, scope, poll_id)?;
        check_option(policy, poll, &option, scope, poll_id)?;

        poll.record(voter, option);
        Ok(())
    }

    fn book(&self, scope: &PollScope) -> Option<&PollBook> {
        match scope {
            PollScope::Global => Some(&self.global),
            PollScope::Local(party) => self.local.get(party),
        }
    }

    fn poll(&self, scope: &PollScope, poll_id: PollId) -> Option<&Poll> {
        self.book(scope).and_then(|book| book.get(poll_id))
    }

    /// Votes recorded for `option`. Zero for unknown polls and options.
    pub fn tally(&self, scope: &PollScope, poll_id: PollId, option: &str) -> u64 {
        self.poll(scope, poll_id)
            .map_or(0, |poll| poll.tally(option))
    }

    /// Per-option counts over the declared options. Empty for unknown polls.
    pub fn results(&self, scope: &PollScope, poll_id: PollId) -> Vec<OptionTally> {
        self.poll(scope, poll_id)
            .map(Poll::results)
            .unwrap_or_default()
    }

    pub fn has_voted(&self, scope: &PollScope, poll_id: PollId, principal: &Principal) -> bool {
        self.poll(scope, poll_id)
            .map_or(false, |poll| poll.has_voted(principal))
    }

    pub fn poll_count(&self, scope: &PollScope) -> usize {
        self.book(scope).map_or(0, PollBook::len)
    }

    pub fn list_poll_ids(&self, scope: &PollScope, offset: usize, limit: usize) -> Page<PollId> {
        self.book(scope).map_or_else(
            || Page {
                total: 0,
                items: Vec::new(),
            },
            |book| Page {
                total: book.len(),
                items: book.ids(offset, limit),
            },
        )
    }

    /// Public details of a poll; the empty closed default for unknown polls.
    pub fn poll_details(
        &self,
        scope: &PollScope,
        poll_id: PollId,
        now: DateTime<Utc>,
    ) -> PollDetails {
        self.poll(scope, poll_id)
            .map(|poll| poll.details(poll_id, *scope, now))
            .unwrap_or_else(|| PollDetails::unknown(poll_id, *scope))
    }
}

fn check_open(
    poll: &Poll,
    scope: PollScope,
    poll_id: PollId,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    match poll.status(now) {
        PollStatus::Open => Ok(()),
        PollStatus::Closed => Err(LedgerError::PollClosed { scope, poll_id }),
    }
}

fn check_not_voted(
    poll: &Poll,
    voter: Principal,
    scope: PollScope,
    poll_id: PollId,
) -> LedgerResult<()> {
    if poll.has_voted(&voter) {
        Err(LedgerError::AlreadyVoted {
            voter,
            scope,
            poll_id,
        })
    } else {
        Ok(())
    }
}

fn check_option(
    policy: OptionPolicy,
    poll: &Poll,
    option: &str,
    scope: PollScope,
    poll_id: PollId,
) -> LedgerResult<()> {
    if policy.permits(poll, option) {
        Ok(())
    } else {
        Err(LedgerError::UndeclaredOption {
            option: option.to_string(),
            scope,
            poll_id,
        })
    }
}
