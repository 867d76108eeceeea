//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Principals are serialised as `0x`-prefixed hex strings.
//! - Datetimes are serialised as timestamps.

pub mod auth;
pub mod membership;
pub mod poll;
