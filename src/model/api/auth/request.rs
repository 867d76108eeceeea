use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::model::{authority::Capability, common::Principal};

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(principal: &Principal, secret: &[u8]) -> HmacSha256 {
    let mut hmac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    hmac.update(principal.as_bytes());
    hmac
}

/// The login key issued to `principal` by the operator holding `secret`.
pub fn login_key(principal: &Principal, secret: &[u8]) -> String {
    BASE32_NOPAD.encode(&keyed_mac(principal, secret).finalize().into_bytes())
}

/// A login attempt for a specific principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub principal: Principal,
    key: String, // Deliberately not public, so it can only be checked via `verify()`
}

impl LoginRequest {
    /// Check the key against the one derived for the principal, in constant time.
    pub fn verify(&self, secret: &[u8]) -> bool {
        match BASE32_NOPAD.decode(self.key.as_bytes()) {
            Ok(tag) => keyed_mac(&self.principal, secret)
                .verify_slice(&tag)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// The logged-in principal and what it may currently do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmI {
    pub principal: Principal,
    pub capabilities: Vec<Capability>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_key_verifies() {
        let request = LoginRequest::for_principal(Principal::example_voter(), b"secret");
        assert!(request.verify(b"secret"));
        assert!(!request.verify(b"other secret"));
    }

    #[test]
    fn key_is_bound_to_principal() {
        let mut request = LoginRequest::for_principal(Principal::example_voter(), b"secret");
        request.principal = Principal::example_voter2();
        assert!(!request.verify(b"secret"));
        assert!(!LoginRequest::example_invalid().verify(b"secret"));
    }

    #[test]
    fn keys_are_unpadded_base32() {
        let key = login_key(&Principal::example_root(), b"secret");
        // 32 bytes of HMAC output.
        assert_eq!(key.len(), 52);
        assert!(!key.contains('='));
        assert_ne!(key, login_key(&Principal::example_party(), b"secret"));
    }
}
