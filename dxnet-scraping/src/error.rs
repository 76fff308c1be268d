use reqwest::StatusCode;
use thiserror::Error;

/// The client is pointed at something other than a DX NET origin.
/// Fatal to the whole operation; nothing is fetched.
#[derive(Debug, Error)]
#[error("client origin {url:?} is not a DX NET host")]
pub struct PreconditionError {
    pub url: String,
}

/// A page could not be retrieved.  Single-page operations propagate this;
/// the multi-difficulty sweep records it and moves on.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("server returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A single record block could not be assembled.  Never escapes the block:
/// the extractor logs it and skips the block.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("could not decode {what} from {input:?}")]
    Decode { what: &'static str, input: String },
    #[error("unexpected page structure: {0}")]
    Structure(String),
}

impl RecordError {
    pub fn decode(what: &'static str, input: impl Into<String>) -> Self {
        RecordError::Decode {
            what,
            input: input.into(),
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        RecordError::Structure(message.into())
    }
}
