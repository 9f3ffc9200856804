use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use gcp_service_auth::SharedError;
use http::StatusCode;

use crate::schema::FieldType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token exchange failed, or yielded no token.
    #[error("authentication failed: {0}")]
    Auth(#[source] SharedError),
    /// The API answered with a non-success status and a readable error envelope.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// An operation was called without an identifier it needs. Nothing was sent.
    #[error("{0} is required")]
    Precondition(&'static str),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to serialize request body: {0}")]
    Encode(#[source] serde_json::Error),
    /// The request never got a response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn auth(error: gcp_service_auth::Error) -> Self {
        Self::Auth(SharedError::new(error))
    }

    /// The HTTP status the API responded with, if the error came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Remote(remote) => Some(remote.http_status),
            Self::Decode(DecodeError::ErrorEnvelope { status, .. }) => Some(*status),
            Self::Transport(error) => error.status(),
            _ => None,
        }
    }
}

/// An error reported by the API, unwrapped from `{"error": {"code", "message", "status"}}`.
///
/// Displays as just the message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub http_status: StatusCode,
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ErrorEnvelope {
    pub(crate) fn into_remote_error(self, http_status: StatusCode) -> RemoteError {
        RemoteError {
            http_status,
            code: self.error.code.unwrap_or(http_status.as_u16()),
            message: self.error.message,
            status: self.error.status,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A success response body wasn't valid JSON for the expected shape.
    #[error("invalid response body: {0}")]
    Body(#[source] serde_json::Error),
    /// A failure response body couldn't be read as an error envelope.
    #[error("{status} response without a readable error envelope: {body}")]
    ErrorEnvelope {
        status: StatusCode,
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("query response contains rows but no schema")]
    MissingSchema,
    #[error("row {row} has {found} cells but the schema has {expected} fields")]
    CellCount {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, field '{field}': cannot decode {value:?} as {ty}: {reason}")]
    Cell {
        row: usize,
        field: Box<str>,
        ty: FieldType,
        value: Box<str>,
        #[source]
        reason: CellError,
    },
    /// Decoded rows didn't fit the caller's row type.
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single cell failed to coerce.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    #[error(transparent)]
    Integer(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Timestamp(TimestampError),
}

#[derive(Debug)]
pub enum TimestampError {
    NotFinite,
    OutOfRange,
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite => f.write_str("epoch seconds must be finite"),
            Self::OutOfRange => f.write_str("epoch seconds out of range"),
        }
    }
}
