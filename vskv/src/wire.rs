//! Client-facing wire protocol: length-delimited, bincode-framed request
//! and response types shared between the server's connection handler and
//! any client that wants to speak this protocol directly (`demos` talks to
//! a `ServiceFacade` in-process instead, but a real client would use these
//! types the same way `vs_client::wire` does for the value store).

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::listing::{ListingRequest, ListingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Insert { key: String, value: Vec<u8> },
    Update { key: String, value: Vec<u8> },
    Upsert { key: String, value: Vec<u8> },
    Fetch { key: String },
    Delete { key: String },
    List {
        prefix: String,
        delimiter: String,
        marker: String,
        max_keys: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Value(Vec<u8>),
    Listing { items: Vec<String>, prefixes: Vec<String>, truncated: bool },
    Err(RemoteError),
}

/// Mirrors the remote-facing status codes from the service facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RemoteError {
    InvalidArgument(String),
    AlreadyExists(String),
    NotFound(String),
    Internal(String),
}

impl From<Error> for RemoteError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidArgument(msg) => RemoteError::InvalidArgument(msg),
            Error::AlreadyExists(msg) => RemoteError::AlreadyExists(msg),
            Error::DoesNotExist(msg) => RemoteError::NotFound(msg),
            Error::Internal(msg) => RemoteError::Internal(msg),
            Error::Parse(msg) => RemoteError::Internal(msg),
        }
    }
}

impl From<ListingResult> for Response {
    fn from(result: ListingResult) -> Self {
        Response::Listing {
            items: result.items,
            prefixes: result.prefixes,
            truncated: result.truncated,
        }
    }
}

impl From<Request> for ListingRequest {
    fn from(request: Request) -> Self {
        match request {
            Request::List { prefix, delimiter, marker, max_keys } => {
                ListingRequest { prefix, delimiter, marker, max_keys }
            }
            _ => ListingRequest::default(),
        }
    }
}
