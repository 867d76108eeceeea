use std::collections::{HashMap, HashSet};

use crate::model::{
    authority::{require_capability, Authority, Capability},
    common::{Principal, RequestState},
    errors::{LedgerError, LedgerResult},
    pagination::Page,
};

/// Owns the set of registered parties and the lifecycle of every
/// (party, voter) membership request.
#[derive(Debug, Default)]
pub struct MembershipRegistry {
    /// Registered parties, in registration order.
    parties: Vec<Principal>,
    /// Registration flags; mirrors `parties` for constant-time lookup.
    registered: HashSet<Principal>,
    /// Current state of each request, keyed by (party, voter).
    requests: HashMap<(Principal, Principal), RequestState>,
    /// Every voter that ever requested each party, in first-request order.
    requested_voters: HashMap<Principal, Vec<Principal>>,
    /// The (party, voter) pairs already present in `requested_voters`.
    indexed: HashSet<(Principal, Principal)>,
}

impl MembershipRegistry {
    /// Register `party`, granting it party capability. Only the root authority may do this.
    pub fn register_party(
        &mut self,
        authority: &mut dyn Authority,
        caller: &Principal,
        party: Principal,
    ) -> LedgerResult<()> {
        require_capability(authority, caller, Capability::RootAuthority)?;
        if self.registered.contains(&party) {
            return Err(LedgerError::AlreadyRegistered(party));
        }

        authority.grant_capability(party, Capability::Party);
        self.parties.push(party);
        self.registered.insert(party);
        Ok(())
    }

    pub fn is_registered(&self, party: &Principal) -> bool {
        self.registered.contains(party)
    }

    /// Ask to join `party` on behalf of `voter`.
    ///
    /// Allowed from any state except `Pending`; the voter is added to the
    /// party's requested-voters index only on their first ever request, even
    /// if a removal already moved them to `Rejected` without one.
    pub fn request_membership(
        &mut self,
        authority: &dyn Authority,
        party: Principal,
        voter: Principal,
    ) -> LedgerResult<()> {
        if !authority.has_capability(&party, Capability::Party) {
            return Err(LedgerError::NotAParty(party));
        }
        let previous = self.state(&party, &voter);
        if previous == RequestState::Pending {
            return Err(LedgerError::RequestAlreadyPending { party, voter });
        }

        if self.indexed.insert((party, voter)) {
            self.requested_voters.entry(party).or_default().push(voter);
        }
        self.requests.insert((party, voter), RequestState::Pending);
        Ok(())
    }

    /// Accept a pending request from `voter`. The caller is the party.
    pub fn accept_membership(
        &mut self,
        authority: &dyn Authority,
        party: Principal,
        voter: Principal,
    ) -> LedgerResult<()> {
        self.decide(authority, party, voter, RequestState::Accepted)
    }

    /// Reject a pending request from `voter`. The caller is the party.
    pub fn reject_membership(
        &mut self,
        authority: &dyn Authority,
        party: Principal,
        voter: Principal,
    ) -> LedgerResult<()> {
        self.decide(authority, party, voter, RequestState::Rejected)
    }

    /// Force `voter` out of `party`, whatever their current state.
    pub fn remove_membership(
        &mut self,
        authority: &dyn Authority,
        party: Principal,
        voter: Principal,
    ) -> LedgerResult<()> {
        require_capability(authority, &party, Capability::Party)?;
        self.requests.insert((party, voter), RequestState::Rejected);
        Ok(())
    }

    fn decide(
        &mut self,
        authority: &dyn Authority,
        party: Principal,
        voter: Principal,
        decision: RequestState,
    ) -> LedgerResult<()> {
        require_capability(authority, &party, Capability::Party)?;
        let state = self.state(&party, &voter);
        if state != RequestState::Pending {
            return Err(LedgerError::NoPendingRequest {
                party,
                voter,
                state,
            });
        }

        self.requests.insert((party, voter), decision);
        Ok(())
    }

    /// Current state of the request from `voter` to `party`.
    pub fn state(&self, party: &Principal, voter: &Principal) -> RequestState {
        self.requests
            .get(&(*party, *voter))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_active_member(&self, party: &Principal, voter: &Principal) -> bool {
        self.state(party, voter).is_active()
    }

    pub fn requested_voters_len(&self, party: &Principal) -> usize {
        self.requested_voters.get(party).map_or(0, Vec::len)
    }

    pub fn list_requested_voters(
        &self,
        party: &Principal,
        offset: usize,
        limit: usize,
    ) -> Page<Principal> {
        let voters = self
            .requested_voters
            .get(party)
            .map_or(&[][..], Vec::as_slice);
        Page::of(voters, offset, limit)
    }

    pub fn list_parties(&self, offset: usize, limit: usize) -> Page<Principal> {
        Page::of(&self.parties, offset, limit)
    }
}
