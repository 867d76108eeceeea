use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, SubsecRound, Utc};
use log::{info, warn};

use crate::model::{
    authority::{Authority, Capability, InMemoryAuthority},
    clock::Clock,
    common::{OptionLabel, PollId, PollScope, Principal, RequestState},
    errors::LedgerResult,
    pagination::Page,
    registry::MembershipRegistry,
    voting::{OptionPolicy, OptionTally, PollDetails, PollSpec, VotingEngine},
};

/// Everything the ledger guards with its lock.
struct LedgerState {
    authority: Box<dyn Authority>,
    registry: MembershipRegistry,
    engine: VotingEngine,
}

/// The membership registry and voting engine behind a single writer.
///
/// Every mutation holds the write lock from its first check to its last
/// write, so mutations happen in one total order and a refused mutation
/// leaves no trace. Reads share the read lock and always see a state
/// between two mutations.
pub struct Ledger {
    state: RwLock<LedgerState>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Create an empty ledger whose in-memory authority recognises `root`.
    pub fn new(root: Principal, policy: OptionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_authority(Box::new(InMemoryAuthority::with_root(root)), policy, clock)
    }

    pub fn with_authority(
        authority: Box<dyn Authority>,
        policy: OptionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                authority,
                registry: MembershipRegistry::default(),
                engine: VotingEngine::new(policy),
            }),
            clock,
        }
    }

    /// The current time to whole seconds, the precision at which deadlines are published.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }

    /// Run a mutation under the write lock, logging its outcome.
    ///
    /// A poisoned lock is recovered: mutations do all their checks before
    /// their first write, so a panic cannot leave the state half-applied.
    fn mutate<T, F>(&self, operation: impl Display, mutation: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerState, DateTime<Utc>) -> LedgerResult<T>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let now = self.now();
        let result = mutation(&mut *state, now);
        match &result {
            Ok(_) => info!("{operation}"),
            Err(err) => warn!("Refused {operation}: {err}"),
        }
        result
    }

    fn read<T>(&self, query: impl FnOnce(&LedgerState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        query(&*state)
    }

    // Membership.

    pub fn register_party(&self, caller: &Principal, party: Principal) -> LedgerResult<()> {
        self.mutate(
            format_args!("register party {party} by {caller}"),
            |state, _| {
                state
                    .registry
                    .register_party(state.authority.as_mut(), caller, party)
            },
        )
    }

    pub fn request_membership(&self, voter: Principal, party: Principal) -> LedgerResult<()> {
        self.mutate(
            format_args!("membership request from {voter} to {party}"),
            |state, _| {
                state
                    .registry
                    .request_membership(state.authority.as_ref(), party, voter)
            },
        )
    }

    pub fn accept_membership(&self, party: Principal, voter: Principal) -> LedgerResult<()> {
        self.mutate(
            format_args!("acceptance of {voter} by {party}"),
            |state, _| {
                state
                    .registry
                    .accept_membership(state.authority.as_ref(), party, voter)
            },
        )
    }

    pub fn reject_membership(&self, party: Principal, voter: Principal) -> LedgerResult<()> {
        self.mutate(
            format_args!("rejection of {voter} by {party}"),
            |state, _| {
                state
                    .registry
                    .reject_membership(state.authority.as_ref(), party, voter)
            },
        )
    }

    pub fn remove_membership(&self, party: Principal, voter: Principal) -> LedgerResult<()> {
        self.mutate(
            format_args!("removal of {voter} from {party}"),
            |state, _| {
                state
                    .registry
                    .remove_membership(state.authority.as_ref(), party, voter)
            },
        )
    }

    pub fn is_active_member(&self, party: &Principal, voter: &Principal) -> bool {
        self.read(|state| state.registry.is_active_member(party, voter))
    }

    pub fn membership_state(&self, party: &Principal, voter: &Principal) -> RequestState {
        self.read(|state| state.registry.state(party, voter))
    }

    pub fn list_requested_voters(
        &self,
        party: &Principal,
        offset: usize,
        limit: usize,
    ) -> Page<Principal> {
        self.read(|state| state.registry.list_requested_voters(party, offset, limit))
    }

    pub fn list_parties(&self, offset: usize, limit: usize) -> Page<Principal> {
        self.read(|state| state.registry.list_parties(offset, limit))
    }

    pub fn capabilities(&self, principal: &Principal) -> Vec<Capability> {
        self.read(|state| state.authority.capabilities(principal))
    }

    // Polls.

    pub fn create_global_poll(&self, caller: &Principal, spec: PollSpec) -> LedgerResult<PollId> {
        let description = spec.description.clone();
        self.mutate(
            format_args!("global poll '{description}' by {caller}"),
            |state, now| {
                state
                    .engine
                    .create_global_poll(state.authority.as_ref(), caller, spec, now)
            },
        )
    }

    pub fn create_local_poll(&self, party: &Principal, spec: PollSpec) -> LedgerResult<PollId> {
        let description = spec.description.clone();
        self.mutate(
            format_args!("local poll '{description}' by {party}"),
            |state, now| {
                state
                    .engine
                    .create_local_poll(state.authority.as_ref(), party, spec, now)
            },
        )
    }

    pub fn cast_global_vote(
        &self,
        voter: Principal,
        poll_id: PollId,
        option: OptionLabel,
    ) -> LedgerResult<()> {
        self.mutate(
            format_args!("vote by {voter} in global poll {poll_id}"),
            |state, now| {
                state
                    .engine
                    .cast_global_vote(state.authority.as_ref(), voter, poll_id, option, now)
            },
        )
    }

    pub fn cast_local_vote(
        &self,
        voter: Principal,
        party: Principal,
        poll_id: PollId,
        option: OptionLabel,
    ) -> LedgerResult<()> {
        self.mutate(
            format_args!("vote by {voter} in poll {poll_id} of {party}"),
            |state, now| {
                state
                    .engine
                    .cast_local_vote(&state.registry, voter, party, poll_id, option, now)
            },
        )
    }

    pub fn tally(&self, scope: &PollScope, poll_id: PollId, option: &str) -> u64 {
        self.read(|state| state.engine.tally(scope, poll_id, option))
    }

    pub fn tally_global(&self, poll_id: PollId, option: &str) -> u64 {
        self.tally(&PollScope::Global, poll_id, option)
    }

    pub fn tally_local(&self, party: Principal, poll_id: PollId, option: &str) -> u64 {
        self.tally(&PollScope::Local(party), poll_id, option)
    }

    pub fn results(&self, scope: &PollScope, poll_id: PollId) -> Vec<OptionTally> {
        self.read(|state| state.engine.results(scope, poll_id))
    }

    pub fn has_voted(&self, scope: &PollScope, poll_id: PollId, principal: &Principal) -> bool {
        self.read(|state| state.engine.has_voted(scope, poll_id, principal))
    }

    pub fn list_poll_ids(&self, scope: &PollScope, offset: usize, limit: usize) -> Page<PollId> {
        self.read(|state| state.engine.list_poll_ids(scope, offset, limit))
    }

    pub fn list_global_poll_ids(&self, offset: usize, limit: usize) -> Page<PollId> {
        self.list_poll_ids(&PollScope::Global, offset, limit)
    }

    pub fn list_local_poll_ids(
        &self,
        party: Principal,
        offset: usize,
        limit: usize,
    ) -> Page<PollId> {
        self.list_poll_ids(&PollScope::Local(party), offset, limit)
    }

    pub fn poll_details(&self, scope: &PollScope, poll_id: PollId) -> PollDetails {
        self.read(|state| state.engine.poll_details(scope, poll_id, self.now()))
    }

    pub fn global_poll_details(&self, poll_id: PollId) -> PollDetails {
        self.poll_details(&PollScope::Global, poll_id)
    }

    pub fn local_poll_details(&self, party: Principal, poll_id: PollId) -> PollDetails {
        self.poll_details(&PollScope::Local(party), poll_id)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::TimeZone;

    use crate::model::{
        clock::ManualClock,
        common::PollStatus,
        errors::{ErrorKind, LedgerError},
    };

    use super::*;

    fn ledger(policy: OptionPolicy) -> (Ledger, ManualClock) {
        let clock = ManualClock::default();
        let ledger = Ledger::new(Principal::example_root(), policy, Arc::new(clock.clone()));
        (ledger, clock)
    }

    /// Everything observable about the example party, its members, and poll 0 of each scope.
    fn observe(ledger: &Ledger) -> Vec<String> {
        let party = Principal::example_party();
        let local = PollScope::Local(party);
        let mut view = vec![
            format!("{:?}", ledger.list_parties(0, usize::MAX)),
            format!("{:?}", ledger.list_requested_voters(&party, 0, usize::MAX)),
            format!("{:?}", ledger.list_global_poll_ids(0, usize::MAX)),
            format!("{:?}", ledger.list_local_poll_ids(party, 0, usize::MAX)),
            format!("{:?}", ledger.capabilities(&Principal::example_party2())),
        ];
        for voter in [Principal::example_voter(), Principal::example_voter2()] {
            view.push(format!("{:?}", ledger.membership_state(&party, &voter)));
            for scope in [PollScope::Global, local] {
                view.push(format!("{:?}", ledger.has_voted(&scope, 0, &voter)));
            }
        }
        for scope in [PollScope::Global, local] {
            for option in ["yes", "no", "maybe"] {
                view.push(ledger.tally(&scope, 0, option).to_string());
            }
        }
        view
    }

    #[test]
    fn budget_scenario() {
        let (ledger, _) = ledger(OptionPolicy::Permissive);
        let (party, voter) = (Principal::example_party(), Principal::example_voter());

        ledger
            .register_party(&Principal::example_root(), party)
            .unwrap();
        ledger.request_membership(voter, party).unwrap();
        ledger.accept_membership(party, voter).unwrap();
        let poll_id = ledger
            .create_local_poll(&party, PollSpec::budget_example())
            .unwrap();
        ledger
            .cast_local_vote(voter, party, poll_id, "yes".to_string())
            .unwrap();

        assert_eq!(ledger.tally_local(party, poll_id, "yes"), 1);
        assert_eq!(ledger.tally_local(party, poll_id, "no"), 0);
    }

    #[test]
    fn global_poll_closes_when_time_passes() {
        let (ledger, clock) = ledger(OptionPolicy::Permissive);
        let poll_id = ledger
            .create_global_poll(&Principal::example_root(), PollSpec::short_example())
            .unwrap();

        clock.advance_secs(2);
        let err = ledger
            .cast_global_vote(Principal::example_voter(), poll_id, "a".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert_eq!(ledger.tally_global(poll_id, "a"), 0);
    }

    #[test]
    fn status_follows_published_deadline_on_fractional_clock() {
        let clock =
            ManualClock::starting_at(Utc.timestamp_opt(1_700_000_000, 700_000_000).unwrap());
        let ledger = Ledger::new(
            Principal::example_root(),
            OptionPolicy::Permissive,
            Arc::new(clock.clone()),
        );
        let poll_id = ledger
            .create_global_poll(&Principal::example_root(), PollSpec::short_example())
            .unwrap();
        let deadline = ledger.global_poll_details(poll_id).deadline;
        assert_eq!(deadline, Utc.timestamp_opt(1_700_000_001, 0).unwrap());

        // 1_700_000_001.7: past the instant but within the published second.
        clock.advance_secs(1);
        assert_eq!(ledger.global_poll_details(poll_id).status, PollStatus::Open);
        ledger
            .cast_global_vote(Principal::example_voter(), poll_id, "a".to_string())
            .unwrap();

        // 1_700_000_002.2: the next second, so closed.
        clock.advance(chrono::Duration::milliseconds(500));
        assert_eq!(
            ledger.global_poll_details(poll_id).status,
            PollStatus::Closed
        );
        let err = ledger
            .cast_global_vote(Principal::example_voter2(), poll_id, "a".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert_eq!(ledger.tally_global(poll_id, "a"), 1);
    }

    #[test]
    fn error_kinds() {
        let (ledger, _) = ledger(OptionPolicy::DeclaredOnly);
        let (root, party, voter) = (
            Principal::example_root(),
            Principal::example_party(),
            Principal::example_voter(),
        );

        let kind = |result: LedgerResult<()>| result.unwrap_err().kind();
        assert_eq!(
            kind(ledger.register_party(&voter, party)),
            ErrorKind::Authorization
        );
        assert_eq!(
            kind(ledger.request_membership(voter, party)),
            ErrorKind::Authorization
        );
        ledger.register_party(&root, party).unwrap();
        assert_eq!(
            kind(ledger.register_party(&root, party)),
            ErrorKind::StateConflict
        );
        assert_eq!(
            kind(ledger.accept_membership(party, voter)),
            ErrorKind::StateConflict
        );
        ledger.request_membership(voter, party).unwrap();
        assert_eq!(
            kind(ledger.request_membership(voter, party)),
            ErrorKind::StateConflict
        );

        let poll_id = ledger
            .create_global_poll(&root, PollSpec::budget_example())
            .unwrap();
        assert_eq!(
            kind(ledger.cast_global_vote(voter, poll_id, "maybe".to_string())),
            ErrorKind::Validation
        );
        assert_eq!(
            kind(ledger.cast_global_vote(party, poll_id, "yes".to_string())),
            ErrorKind::Authorization
        );
        ledger
            .cast_global_vote(voter, poll_id, "yes".to_string())
            .unwrap();
        assert_eq!(
            kind(ledger.cast_global_vote(voter, poll_id, "yes".to_string())),
            ErrorKind::StateConflict
        );
    }

    #[test]
    fn refused_operations_change_nothing() {
        let (ledger, clock) = ledger(OptionPolicy::DeclaredOnly);
        let (root, party, voter, other) = (
            Principal::example_root(),
            Principal::example_party(),
            Principal::example_voter(),
            Principal::example_voter2(),
        );
        ledger.register_party(&root, party).unwrap();
        ledger.request_membership(voter, party).unwrap();
        ledger.accept_membership(party, voter).unwrap();
        ledger.request_membership(other, party).unwrap();
        ledger
            .create_global_poll(&root, PollSpec::budget_example())
            .unwrap();
        ledger
            .create_local_poll(&party, PollSpec::short_example())
            .unwrap();
        ledger
            .cast_global_vote(voter, 0, "yes".to_string())
            .unwrap();

        let before = observe(&ledger);
        let refusals: Vec<LedgerResult<()>> = vec![
            ledger.register_party(&root, party),
            ledger.register_party(&voter, Principal::example_party2()),
            ledger.request_membership(other, party),
            ledger.request_membership(voter, Principal::example_party2()),
            ledger.accept_membership(party, voter),
            ledger.reject_membership(voter, other),
            ledger.remove_membership(voter, other),
            ledger
                .create_global_poll(&party, PollSpec::budget_example())
                .map(drop),
            ledger
                .create_local_poll(&voter, PollSpec::budget_example())
                .map(drop),
            ledger.cast_global_vote(voter, 0, "no".to_string()),
            ledger.cast_global_vote(party, 0, "no".to_string()),
            ledger.cast_global_vote(other, 0, "maybe".to_string()),
            ledger.cast_local_vote(other, party, 0, "a".to_string()),
            ledger.cast_local_vote(voter, party, 0, "maybe".to_string()),
            ledger.cast_global_vote(other, 9, "yes".to_string()),
        ];
        for refusal in refusals {
            assert!(refusal.is_err());
        }
        assert_eq!(before, observe(&ledger));

        clock.advance_secs(5);
        assert!(matches!(
            ledger.cast_local_vote(voter, party, 0, "a".to_string()),
            Err(LedgerError::PollClosed { .. })
        ));
        assert_eq!(before, observe(&ledger));
    }

    #[test]
    fn concurrent_duplicate_votes_count_once() {
        let (ledger, _) = ledger(OptionPolicy::Permissive);
        let poll_id = ledger
            .create_global_poll(&Principal::example_root(), PollSpec::budget_example())
            .unwrap();
        let voter = Principal::example_voter();
        let ledger = &ledger;

        let successes = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(move || ledger.cast_global_vote(voter, poll_id, "yes".to_string()))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(Result::is_ok)
                .count()
        });

        assert_eq!(successes, 1);
        assert_eq!(ledger.tally_global(poll_id, "yes"), 1);
    }

    #[test]
    fn concurrent_distinct_voters_all_count() {
        let (ledger, _) = ledger(OptionPolicy::Permissive);
        let poll_id = ledger
            .create_global_poll(&Principal::example_root(), PollSpec::budget_example())
            .unwrap();
        let voters: Vec<Principal> = (0..32).map(|_| Principal::random()).collect();

        thread::scope(|scope| {
            for voter in &voters {
                let ledger = &ledger;
                scope.spawn(move || {
                    ledger
                        .cast_global_vote(*voter, poll_id, "yes".to_string())
                        .unwrap()
                });
            }
        });

        assert_eq!(ledger.tally_global(poll_id, "yes"), voters.len() as u64);
        assert!(voters
            .iter()
            .all(|voter| ledger.has_voted(&PollScope::Global, poll_id, voter)));
    }

    #[test]
    fn registered_party_gains_capability() {
        let (ledger, _) = ledger(OptionPolicy::Permissive);
        let party = Principal::example_party();
        assert!(ledger.capabilities(&party).is_empty());
        ledger
            .register_party(&Principal::example_root(), party)
            .unwrap();
        assert_eq!(ledger.capabilities(&party), vec![Capability::Party]);
        assert_eq!(
            ledger.capabilities(&Principal::example_root()),
            vec![Capability::RootAuthority]
        );
    }
}
