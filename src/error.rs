use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::errors::{ErrorKind, LedgerError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Self::Ledger(err) => match err.kind() {
                ErrorKind::Authorization => Status::Forbidden,
                ErrorKind::StateConflict => Status::Conflict,
                ErrorKind::Closed => Status::Gone,
                ErrorKind::Validation => Status::UnprocessableEntity,
            },
            Self::Jwt(_) | Self::Internal(_) => Status::InternalServerError,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        Err(status)
    }
}
