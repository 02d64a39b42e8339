use log::error;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between an incoming request and the contract.
///
/// The gateway deliberately has no HTTP error taxonomy: the remote contract is
/// the authority, and any failure talking to it answers `500`. The variants
/// exist so the logs say which layer gave up.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to reach the contract node: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Contract call failed: {0}")]
    Contract(String),
    #[error("Malformed contract response: {0}")]
    Response(String),
    #[error("Invalid signing key: {0}")]
    SigningKey(String),
}

impl From<rocket::serde::json::serde_json::Error> for Error {
    fn from(err: rocket::serde::json::serde_json::Error) -> Self {
        Self::Response(err.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        error!("{self}");
        Err(Status::InternalServerError)
    }
}
