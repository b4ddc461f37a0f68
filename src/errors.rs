//! Error types for page retrieval.
//!
//! Every failure a caller can observe from [`crate::MediawikiStorage::get`] is a
//! [`StorageError`]. Validation problems are returned straight away, everything
//! after the request has been handed to the transport arrives through the
//! failure callback and the pending result.
//!
//! Exported items:
//! - `StorageError` - main error enum.
//! - `ArgumentKind` - which part of a request failed validation.
//! - `EnvelopeStep` - where navigation of the API envelope stopped.
//! - `Result<T>` - alias for `std::result::Result<T, StorageError>`.

use std::error::Error;
use std::fmt;

use tokio::task::JoinError;

use crate::reqwest_client::RustError;

/// The canonical result type used across the crate.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Part of a request descriptor that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// The descriptor itself was not a JSON object.
    NotAnObject,
    /// `host` was missing or empty.
    Host,
    /// None of `page_name`, `page_id`, `revision_id` was usable.
    SelectorMissing,
}

impl ArgumentKind {
    fn message(&self) -> &'static str {
        match self {
            ArgumentKind::NotAnObject => "descriptor must be an object",
            ArgumentKind::Host => "host must be a non-empty string",
            ArgumentKind::SelectorMissing => {
                "one of (page_name|page_id|revision_id) must be a non-empty string"
            }
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKind::NotAnObject => write!(f, "not-an-object"),
            ArgumentKind::Host => write!(f, "host"),
            ArgumentKind::SelectorMissing => write!(f, "selector-missing"),
        }
    }
}

/// Step of the envelope `query.pages.<first>.revisions[0]["*"]` that was missing
/// or had the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStep {
    Query,
    Pages,
    FirstPage,
    Revisions,
    FirstRevision,
    Content,
}

impl fmt::Display for EnvelopeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            EnvelopeStep::Query => "query",
            EnvelopeStep::Pages => "query.pages",
            EnvelopeStep::FirstPage => "query.pages.<first>",
            EnvelopeStep::Revisions => "query.pages.<first>.revisions",
            EnvelopeStep::FirstRevision => "query.pages.<first>.revisions[0]",
            EnvelopeStep::Content => "query.pages.<first>.revisions[0][\"*\"]",
        };
        write!(f, "{}", path)
    }
}

/// Everything that can go wrong while fetching a page.
///
/// - `InvalidArgument` - the request was rejected before any network activity.
/// - `Transport` - the transport could not deliver a JSON response.
/// - `MalformedEnvelope` - the response was not shaped like a query result.
/// - `InvalidPageJson` - the page exists but its body is not JSON.
/// - `Interrupted` - the task driving the request panicked or was aborted. Only
///    ever seen through the pending result, never through callbacks.
#[derive(Debug)]
pub enum StorageError {
    InvalidArgument { kind: ArgumentKind },
    Transport(RustError),
    MalformedEnvelope { step: EnvelopeStep },
    InvalidPageJson(serde_json::Error),
    Interrupted(JoinError),
}

impl StorageError {
    /// Construct an invalid argument error.
    pub fn invalid_arg(kind: ArgumentKind) -> Self {
        StorageError::InvalidArgument { kind }
    }

    /// Construct an envelope error, remembering where navigation stopped.
    pub fn malformed(step: EnvelopeStep) -> Self {
        StorageError::MalformedEnvelope { step }
    }

    /// Returns a short description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidArgument { .. } => "InvalidArgument",
            StorageError::Transport(_) => "TransportError",
            StorageError::MalformedEnvelope { .. } => "MalformedEnvelope",
            StorageError::InvalidPageJson(_) => "InvalidPageJson",
            StorageError::Interrupted(_) => "Interrupted",
        }
    }

    /// True for errors raised before anything was sent.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StorageError::InvalidArgument { .. })
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidArgument { kind } => write!(f, "{}", kind.message()),
            StorageError::Transport(e) => write!(f, "{}", e),
            StorageError::MalformedEnvelope { .. } => write!(f, "unexpected query result"),
            StorageError::InvalidPageJson(_) => write!(f, "page contents are not a valid json"),
            StorageError::Interrupted(e) => write!(f, "request task did not finish: {}", e),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Transport(e) => Some(e),
            StorageError::InvalidPageJson(e) => Some(e),
            StorageError::Interrupted(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RustError> for StorageError {
    fn from(value: RustError) -> Self {
        Self::Transport(value)
    }
}
impl From<reqwest::Error> for StorageError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(RustError::from(value))
    }
}
impl From<reqwest_middleware::Error> for StorageError {
    fn from(value: reqwest_middleware::Error) -> Self {
        Self::Transport(RustError::from(value))
    }
}
impl From<url::ParseError> for StorageError {
    fn from(value: url::ParseError) -> Self {
        Self::Transport(RustError::from(value))
    }
}
