use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::{common::Principal, errors::LedgerError};

/// A grantable permission checked before privileged operations.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Capability {
    RootAuthority = 0,
    Party = 1,
}

impl Display for Capability {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::RootAuthority => "root authority",
                Self::Party => "party",
            }
        )
    }
}

/// The capability system the ledger consults.
///
/// The ledger only ever grants capabilities through `grant_capability`, and
/// only when registering a party.
pub trait Authority: Send + Sync {
    fn has_capability(&self, principal: &Principal, capability: Capability) -> bool;

    fn grant_capability(&mut self, principal: Principal, capability: Capability);

    /// All capabilities currently held by `principal`.
    fn capabilities(&self, principal: &Principal) -> Vec<Capability> {
        [Capability::RootAuthority, Capability::Party]
            .into_iter()
            .filter(|capability| self.has_capability(principal, *capability))
            .collect()
    }
}

/// Fail with [`LedgerError::MissingCapability`] unless `principal` holds `capability`.
pub fn require_capability(
    authority: &dyn Authority,
    principal: &Principal,
    capability: Capability,
) -> Result<(), LedgerError> {
    if authority.has_capability(principal, capability) {
        Ok(())
    } else {
        Err(LedgerError::MissingCapability {
            principal: *principal,
            capability,
        })
    }
}

/// An [`Authority`] that keeps its grants in memory.
#[derive(Debug, Default)]
pub struct InMemoryAuthority {
    grants: HashMap<Principal, HashSet<Capability>>,
}

impl InMemoryAuthority {
    /// Create an authority where `root` holds [`Capability::RootAuthority`].
    pub fn with_root(root: Principal) -> Self {
        let mut authority = Self::default();
        authority.grant_capability(root, Capability::RootAuthority);
        authority
    }
}

impl Authority for InMemoryAuthority {
    fn has_capability(&self, principal: &Principal, capability: Capability) -> bool {
        self.grants
            .get(principal)
            .map_or(false, |granted| granted.contains(&capability))
    }

    fn grant_capability(&mut self, principal: Principal, capability: Capability) {
        self.grants.entry(principal).or_default().insert(capability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_per_principal_and_capability() {
        let mut authority = InMemoryAuthority::with_root(Principal::example_root());
        authority.grant_capability(Principal::example_party(), Capability::Party);

        assert!(authority.has_capability(&Principal::example_root(), Capability::RootAuthority));
        assert!(!authority.has_capability(&Principal::example_root(), Capability::Party));
        assert!(authority.has_capability(&Principal::example_party(), Capability::Party));
        assert!(!authority.has_capability(&Principal::example_voter(), Capability::Party));
        assert_eq!(
            authority.capabilities(&Principal::example_party()),
            vec![Capability::Party]
        );
        assert!(authority
            .capabilities(&Principal::example_voter())
            .is_empty());
    }
}
