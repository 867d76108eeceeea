mod membership;
mod poll;
mod principal;

pub use membership::RequestState;
pub use poll::{OptionLabel, PollId, PollScope, PollStatus};
pub use principal::{Principal, PrincipalError, PRINCIPAL_LENGTH};
