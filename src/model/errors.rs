use thiserror::Error;

use crate::model::{
    authority::Capability,
    common::{OptionLabel, PollId, PollScope, Principal, RequestState},
};

/// Why a ledger mutation was refused. A refused mutation changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{principal} lacks the {capability} capability")]
    MissingCapability {
        principal: Principal,
        capability: Capability,
    },
    #[error("{0} is not a registered party")]
    NotAParty(Principal),
    #[error("{voter} may not vote in {scope} poll {poll_id}")]
    IneligibleVoter {
        voter: Principal,
        scope: PollScope,
        poll_id: PollId,
    },
    #[error("{0} is already a registered party")]
    AlreadyRegistered(Principal),
    #[error("{voter} already has a pending request to join {party}")]
    RequestAlreadyPending { party: Principal, voter: Principal },
    #[error("{voter} has no pending request to join {party} (currently {state})")]
    NoPendingRequest {
        party: Principal,
        voter: Principal,
        state: RequestState,
    },
    #[error("{voter} has already voted in {scope} poll {poll_id}")]
    AlreadyVoted {
        voter: Principal,
        scope: PollScope,
        poll_id: PollId,
    },
    #[error("{scope} poll {poll_id} is closed")]
    PollClosed { scope: PollScope, poll_id: PollId },
    #[error("'{option}' is not an option of {scope} poll {poll_id}")]
    UndeclaredOption {
        option: OptionLabel,
        scope: PollScope,
        poll_id: PollId,
    },
}

/// The broad category of a [`LedgerError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller lacks a required capability or eligibility.
    Authorization,
    /// The operation is illegal from the current state.
    StateConflict,
    /// The poll's deadline has passed.
    Closed,
    /// The request itself is malformed for this poll.
    Validation,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCapability { .. } | Self::NotAParty(_) | Self::IneligibleVoter { .. } => {
                ErrorKind::Authorization
            }
            Self::AlreadyRegistered(_)
            | Self::RequestAlreadyPending { .. }
            | Self::NoPendingRequest { .. }
            | Self::AlreadyVoted { .. } => ErrorKind::StateConflict,
            Self::PollClosed { .. } => ErrorKind::Closed,
            Self::UndeclaredOption { .. } => ErrorKind::Validation,
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
