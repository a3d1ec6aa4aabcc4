//! Error type for `legalward-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request never produced a response (connection, TLS, timeout).
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-success status.
  #[error("{endpoint} returned {status}: {body}")]
  Status {
    endpoint: String,
    status:   u16,
    body:     String,
  },

  /// The response body did not have the expected shape.
  #[error("unexpected response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source:   serde_json::Error,
  },
}

impl Error {
  /// The HTTP status, for [`Error::Status`].
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self.status(), Some(401 | 403))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
