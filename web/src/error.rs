use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bankid::error::ErrorKind;
use bankid::Error as BankIdError;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(BankIdError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.0.error_kind {
            ErrorKind::Transport(_) | ErrorKind::Decode => {
                warn!("{}", self.0);
                (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
            }
            ErrorKind::Api(_) => {
                debug!("{}", self.0);
                (StatusCode::BAD_REQUEST, "BAD REQUEST").into_response()
            }
            ErrorKind::Provisioning(_) => {
                error!("{}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<BankIdError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
