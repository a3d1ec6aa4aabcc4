//! The authenticated session, as reported by the headless auth backend.

use serde::{Deserialize, Serialize};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:      i64,
  pub email:   String,
  /// Display name chosen by the auth backend (often the email).
  pub display: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Session {
  #[default]
  Anonymous,
  Authenticated(User),
}

impl Session {
  pub fn is_authenticated(&self) -> bool {
    matches!(self, Self::Authenticated(_))
  }

  pub fn user(&self) -> Option<&User> {
    match self {
      Self::Authenticated(user) => Some(user),
      Self::Anonymous => None,
    }
  }
}

/// Login methods advertised by the auth backend's configuration endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginMethods {
  /// Email + password login is available.
  pub email:     bool,
  /// Ids of redirect-based social providers.
  pub providers: Vec<String>,
}
