use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{self, FromRequest},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::common::Principal;
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token naming the logged-in principal.
///
/// Capabilities are not stored here; handlers check them against the ledger,
/// so grants made after login take effect immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    principal: Principal,
}

impl AuthToken {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    /// Get the logged-in principal.
    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, Error> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build((AUTH_TOKEN_COOKIE, token))
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .same_site(SameSite::Strict)
            .build())
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
        .map_err(|err| Error::Unauthorized(format!("Invalid auth token: {err}")))
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an AuthToken from the cookie, failing with `401` if it is absent or invalid.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<Config>() else {
            return request::Outcome::Error((
                Status::InternalServerError,
                Error::Internal("Config is not managed".to_string()),
            ));
        };

        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return request::Outcome::Error((
                Status::Unauthorized,
                Error::Unauthorized("Not logged in".to_string()),
            ));
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => request::Outcome::Success(token),
            Err(err) => request::Outcome::Error((Status::Unauthorized, err)),
        }
    }
}
