use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::HEXLOWER_PERMISSIVE;
use rocket::{
    form::{self, FromFormField, ValueField},
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in a principal address.
pub const PRINCIPAL_LENGTH: usize = 20;

/// An opaque, globally unique identity: a voter, a party, or the root authority.
///
/// Principals are serialised as `0x`-prefixed lowercase hex strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal([u8; PRINCIPAL_LENGTH]);

impl Principal {
    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_LENGTH] {
        &self.0
    }

    /// Generate a fresh random principal.
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", HEXLOWER_PERMISSIVE.encode(&self.0))
    }
}

impl Debug for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Principal({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalError {
    #[error("Principal must be {expected} hex digits, got {0}", expected = PRINCIPAL_LENGTH * 2)]
    Length(usize),
    #[error("Principal is not valid hex: {0}")]
    Hex(#[from] data_encoding::DecodeError),
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() != PRINCIPAL_LENGTH * 2 {
            return Err(PrincipalError::Length(hex.len()));
        }
        let mut bytes = [0; PRINCIPAL_LENGTH];
        HEXLOWER_PERMISSIVE
            .decode_mut(hex.as_bytes(), &mut bytes)
            .map_err(|partial| partial.error)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.to_string()
    }
}

impl<'a> FromParam<'a> for Principal {
    type Error = PrincipalError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

impl UriDisplay<Path> for Principal {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] Principal);

#[rocket::async_trait]
impl<'r> FromFormField<'r> for Principal {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field
            .value
            .parse()
            .map_err(|err: PrincipalError| form::Error::validation(err.to_string()).into())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_lowercase_hex() {
        let principal = Principal::example_party();
        assert_eq!(
            principal.to_string(),
            "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
        );
    }

    #[test]
    fn parse_accepts_case_and_missing_prefix() {
        let expected = Principal::example_party();
        let upper = "0XA1A1A1A1A1A1A1A1A1A1A1A1A1A1A1A1A1A1A1A1";
        let bare = "a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
        assert_eq!(upper.parse::<Principal>().unwrap(), expected);
        assert_eq!(bare.parse::<Principal>().unwrap(), expected);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Principal>(),
            Err(PrincipalError::Length(4))
        );
        assert!(matches!(
            "0xzz1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a".parse::<Principal>(),
            Err(PrincipalError::Hex(_))
        ));
    }
}
