//! Discovery lifecycle: the three states and the user transitions between
//! them.
//!
//! The detection service is the source of truth for a discovery's state. The
//! client requests a transition, waits for confirmation, and then reloads the
//! listings from the server; lists are never edited speculatively.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{error, info};

use crate::{
  Error,
  discovery::{DiscoverySummary, StateChange},
  recent::{LocalStorage, RecentlyViewed},
  service::DiscoveryService,
};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryState {
  /// Set by the service when the conflict is detected.
  Pending,
  Tracking,
  Discarded,
}

impl DiscoveryState {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

// ─── Transition ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Transition {
  Track,
  Discard,
}

impl Transition {
  pub fn target(self) -> DiscoveryState {
    match self {
      Self::Track => DiscoveryState::Tracking,
      Self::Discard => DiscoveryState::Discarded,
    }
  }

  /// The state reached by applying this transition to `from`.
  ///
  /// Repeating a transition is idempotent. Moving a resolved discovery to
  /// the other resolved state is rejected; the service may still accept it.
  pub fn apply(self, from: DiscoveryState) -> crate::Result<DiscoveryState> {
    let to = self.target();
    if from == DiscoveryState::Pending || from == to {
      Ok(to)
    } else {
      Err(Error::InvalidTransition { from, transition: self })
    }
  }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// The pending and tracking listings, as last loaded from the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryLists {
  pub pending:  Vec<DiscoverySummary>,
  pub tracking: Vec<DiscoverySummary>,
}

impl DiscoveryLists {
  pub fn find(&self, id: i64) -> Option<&DiscoverySummary> {
    self.pending.iter().chain(&self.tracking).find(|d| d.id == id)
  }
}

/// The confirmed result of a transition, together with the reloaded lists.
///
/// The transition and the reload are separate requests: a failed reload does
/// not undo a confirmed transition, so it is carried here as a read error.
#[derive(Debug)]
pub struct Outcome<E> {
  pub change: StateChange,
  pub lists:  Result<DiscoveryLists, E>,
}

/// Drives transitions against the service and keeps the recently-viewed
/// store consistent with them.
pub struct Lifecycle<'a, S, R> {
  service: &'a S,
  recent:  &'a RecentlyViewed<R>,
}

impl<'a, S, R> Lifecycle<'a, S, R>
where
  S: DiscoveryService,
  R: LocalStorage,
{
  pub fn new(service: &'a S, recent: &'a RecentlyViewed<R>) -> Self {
    Self { service, recent }
  }

  /// Load both listings from the service.
  pub async fn reload(&self) -> Result<DiscoveryLists, S::Error> {
    let pending = self.service.list_pending().await?;
    let tracking = self.service.list_tracking().await?;
    Ok(DiscoveryLists { pending, tracking })
  }

  /// Ask the service to start tracking `id`.
  pub async fn track(&self, id: i64) -> Result<Outcome<S::Error>, S::Error> {
    let change = self.request(id, Transition::Track).await?;
    Ok(self.finish(change).await)
  }

  /// Ask the service to discard `id`. Once confirmed, the discovery is also
  /// dropped from the recently-viewed store.
  pub async fn discard(&self, id: i64) -> Result<Outcome<S::Error>, S::Error> {
    let change = self.request(id, Transition::Discard).await?;
    self.recent.remove_view(id).await;
    Ok(self.finish(change).await)
  }

  async fn request(
    &self,
    id: i64,
    transition: Transition,
  ) -> Result<StateChange, S::Error> {
    let change = match transition {
      Transition::Track => self.service.track(id).await,
      Transition::Discard => self.service.discard(id).await,
    }
    .inspect_err(|e| error!(id, %transition, error = %e, "transition failed"))?;

    info!(id, %transition, state = %change.state, "transition confirmed");
    Ok(change)
  }

  async fn finish(&self, change: StateChange) -> Outcome<S::Error> {
    let lists = self
      .reload()
      .await
      .inspect_err(|e| error!(error = %e, "reload after transition failed"));
    Outcome { change, lists }
  }
}
