//! The membership and polling ledger, plus the types the API exchanges.

pub mod api;
pub mod authority;
pub mod clock;
pub mod common;
pub mod errors;
pub mod ledger;
pub mod pagination;
pub mod registry;
pub mod voting;
