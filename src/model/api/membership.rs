use serde::{Deserialize, Serialize};

use crate::model::common::{Principal, RequestState};

/// Body of a party registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPartyRequest {
    pub party: Principal,
}

/// Where a voter stands with a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatus {
    pub state: RequestState,
    pub active: bool,
}

impl From<RequestState> for MembershipStatus {
    fn from(state: RequestState) -> Self {
        Self {
            state,
            active: state.is_active(),
        }
    }
}
