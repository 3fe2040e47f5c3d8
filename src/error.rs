//! Errors raised by the content repository layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid repository endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Listing has no next page")]
    NoNextPage,

    #[error("Cursor does not belong to the configured repository: {0}")]
    ForeignCursor(String),

    #[error("Repository did not advertise a master ref")]
    MissingMasterRef,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed repository response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
