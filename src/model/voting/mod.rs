mod engine;
mod policy;
mod poll;

pub use engine::VotingEngine;
pub use policy::OptionPolicy;
pub use poll::{OptionTally, Poll, PollBook, PollDetails, PollSpec, MAX_POLL_DURATION_SECS};
