mod request;
mod token;

pub use request::{login_key, LoginRequest, WhoAmI};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
