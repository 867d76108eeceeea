use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// States in the lifecycle of a (party, voter) membership request.
///
/// Removal from a party is represented by `Rejected`, never by deletion,
/// so a removed voter may re-request like any rejected one.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RequestState {
    /// The voter has never asked to join the party.
    #[default]
    NeverRequested = 0,
    /// Awaiting a decision from the party.
    Pending = 1,
    /// The voter is an active member of the party.
    Accepted = 2,
    /// Turned down, or removed after acceptance.
    Rejected = 3,
}

impl RequestState {
    pub fn is_active(self) -> bool {
        self == Self::Accepted
    }
}

impl Display for RequestState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::NeverRequested => "never requested",
                Self::Pending => "pending",
                Self::Accepted => "accepted",
                Self::Rejected => "rejected",
            }
        )
    }
}
