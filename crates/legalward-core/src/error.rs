//! Error types for `legalward-core`.

use thiserror::Error;

use crate::lifecycle::{DiscoveryState, Transition};

#[derive(Debug, Error)]
pub enum Error {
  #[error("relevance {0} is outside 0..=100")]
  RelevanceOutOfRange(i64),

  #[error("cannot {transition} a discovery that is already {from}")]
  InvalidTransition {
    from:       DiscoveryState,
    transition: Transition,
  },

  #[error("storage error: {0}")]
  Storage(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
