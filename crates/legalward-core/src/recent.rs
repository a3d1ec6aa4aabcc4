//! The recently-viewed cache: a bounded, most-recent-first list of the
//! discoveries the user opened, kept in local key/value storage.
//!
//! View recording is best-effort. Storage and parse failures are logged and
//! recovered here; callers never see them.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  Error, Result,
  discovery::{DiscoveryDetail, DiscoverySummary},
  lifecycle::DiscoveryState,
  tier::{ImpactTier, Relevance},
  timestamp,
};

/// The single storage key holding the JSON-encoded entry list.
pub const RECENTLY_VIEWED_KEY: &str = "recently_viewed_discoveries";

/// Maximum number of entries kept in storage.
pub const MAX_RECENT: usize = 10;

// ─── Storage trait ───────────────────────────────────────────────────────────

/// Durable string key/value storage local to the client.
pub trait LocalStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  fn set<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Process-local storage; contents are lost on exit.
///
/// Cloning is cheap and clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
    self
      .inner
      .lock()
      .map_err(|_| Error::Storage("memory storage lock poisoned".into()))
  }
}

impl LocalStorage for MemoryStorage {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.lock()?.get(key).cloned())
  }

  async fn set(&self, key: &str, value: String) -> Result<()> {
    self.lock()?.insert(key.to_owned(), value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    self.lock()?.remove(key);
    Ok(())
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// The fields of a discovery worth remembering when it is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewedDiscovery {
  pub discovery_id:  i64,
  pub bill_id:       String,
  pub bill_title:    String,
  pub impact_count:  u32,
  pub max_relevance: Relevance,
  pub state:         DiscoveryState,
}

impl From<&DiscoverySummary> for ViewedDiscovery {
  fn from(d: &DiscoverySummary) -> Self {
    Self {
      discovery_id:  d.id,
      bill_id:       d.bill_id.clone(),
      bill_title:    d.bill_title.clone(),
      impact_count:  d.impact_count,
      max_relevance: d.max_relevance,
      state:         d.state,
    }
  }
}

impl From<&DiscoveryDetail> for ViewedDiscovery {
  fn from(d: &DiscoveryDetail) -> Self {
    Self {
      discovery_id:  d.id,
      bill_id:       d.bill_id.clone(),
      bill_title:    d.bill_title.clone(),
      impact_count:  d.impact_count(),
      max_relevance: d.max_relevance,
      state:         d.state,
    }
  }
}

/// A locally cached pointer to a discovery the user opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentlyViewedEntry {
  pub discovery_id:  i64,
  pub bill_id:       String,
  pub bill_title:    String,
  pub impact_count:  u32,
  pub max_relevance: Relevance,
  /// Snapshot; refreshed from the listings when the dashboard is built.
  pub state:         DiscoveryState,
  #[serde(with = "timestamp::utc")]
  pub viewed_at:     DateTime<Utc>,
}

impl RecentlyViewedEntry {
  pub fn new(viewed: ViewedDiscovery, viewed_at: DateTime<Utc>) -> Self {
    Self {
      discovery_id: viewed.discovery_id,
      bill_id: viewed.bill_id,
      bill_title: viewed.bill_title,
      impact_count: viewed.impact_count,
      max_relevance: viewed.max_relevance,
      state: viewed.state,
      viewed_at,
    }
  }

  pub fn tier(&self) -> ImpactTier { self.max_relevance.tier() }

  /// Copy the current relevance, impact count and state of `current`,
  /// keeping the original view time.
  pub fn refreshed(&self, current: &DiscoverySummary) -> Self {
    Self {
      impact_count: current.impact_count,
      max_relevance: current.max_relevance,
      state: current.state,
      ..self.clone()
    }
  }
}

/// Tolerant shape of a stored entry; anything may be missing.
#[derive(Deserialize)]
struct StoredEntry {
  discovery_id:  Option<i64>,
  bill_id:       Option<String>,
  bill_title:    Option<String>,
  #[serde(default)]
  impact_count:  u32,
  #[serde(default)]
  max_relevance: Relevance,
  state:         Option<DiscoveryState>,
  viewed_at:     Option<String>,
}

impl StoredEntry {
  fn into_entry(self) -> Option<RecentlyViewedEntry> {
    let discovery_id = self.discovery_id.filter(|id| *id != 0)?;
    let bill_id = self.bill_id.filter(|s| !s.is_empty())?;
    let bill_title = self.bill_title.filter(|s| !s.is_empty())?;
    let viewed_at = self.viewed_at.as_deref().and_then(timestamp::parse_datetime)?;
    Some(RecentlyViewedEntry {
      discovery_id,
      bill_id,
      bill_title,
      impact_count: self.impact_count,
      max_relevance: self.max_relevance,
      state: self.state.unwrap_or(DiscoveryState::Pending),
      viewed_at,
    })
  }
}

/// Decode the stored list, dropping malformed entries one by one.
pub fn decode_entries(raw: &str) -> Result<Vec<RecentlyViewedEntry>> {
  let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
  let mut entries: Vec<_> = values
    .into_iter()
    .filter_map(|v| serde_json::from_value::<StoredEntry>(v).ok())
    .filter_map(StoredEntry::into_entry)
    .collect();
  sort_newest_first(&mut entries);
  Ok(entries)
}

fn sort_newest_first(entries: &mut [RecentlyViewedEntry]) {
  entries.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
}

/// Insert `entry`, replacing any entry for the same discovery, and keep the
/// `cap` most recent.
pub fn push_view(
  entries: &mut Vec<RecentlyViewedEntry>,
  entry: RecentlyViewedEntry,
  cap: usize,
) {
  entries.retain(|e| e.discovery_id != entry.discovery_id);
  entries.insert(0, entry);
  sort_newest_first(entries);
  entries.truncate(cap);
}

/// Drop the entry for `discovery_id`. Returns whether one was present.
pub fn remove_entry(entries: &mut Vec<RecentlyViewedEntry>, discovery_id: i64) -> bool {
  let before = entries.len();
  entries.retain(|e| e.discovery_id != discovery_id);
  entries.len() != before
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The recently-viewed cache over a [`LocalStorage`] backend.
#[derive(Debug, Clone)]
pub struct RecentlyViewed<S> {
  storage: S,
}

impl<S: LocalStorage> RecentlyViewed<S> {
  pub fn new(storage: S) -> Self { Self { storage } }

  pub fn storage(&self) -> &S { &self.storage }

  /// All valid entries, newest first. Empty on any read or parse failure.
  pub async fn list_views(&self) -> Vec<RecentlyViewedEntry> {
    match self.load().await {
      Ok(entries) => entries,
      Err(e) => {
        warn!(error = %e, "could not read recently viewed discoveries");
        Vec::new()
      }
    }
  }

  /// Record that `viewed` was opened just now.
  pub async fn record_view(&self, viewed: impl Into<ViewedDiscovery>) {
    self.record_view_at(viewed, Utc::now()).await;
  }

  /// Record that `viewed` was opened at `at`.
  pub async fn record_view_at(
    &self,
    viewed: impl Into<ViewedDiscovery>,
    at: DateTime<Utc>,
  ) {
    let mut entries = self.list_views().await;
    push_view(&mut entries, RecentlyViewedEntry::new(viewed.into(), at), MAX_RECENT);
    if let Err(e) = self.save(&entries).await {
      warn!(error = %e, "could not save recently viewed discovery");
    }
  }

  /// Forget the entry for `discovery_id`, returning the remaining entries.
  /// Absent ids leave storage untouched.
  pub async fn remove_view(&self, discovery_id: i64) -> Vec<RecentlyViewedEntry> {
    let mut entries = self.list_views().await;
    if remove_entry(&mut entries, discovery_id)
      && let Err(e) = self.save(&entries).await
    {
      warn!(error = %e, discovery_id, "could not remove recently viewed discovery");
    }
    entries
  }

  #[cfg(test)]
  pub async fn clear(&self) {
    if let Err(e) = self.storage.remove(RECENTLY_VIEWED_KEY).await {
      warn!(error = %e, "could not clear recently viewed discoveries");
    }
  }

  async fn load(&self) -> Result<Vec<RecentlyViewedEntry>> {
    let raw = self
      .storage
      .get(RECENTLY_VIEWED_KEY)
      .await
      .map_err(|e| Error::Storage(e.to_string()))?;
    match raw {
      Some(raw) => decode_entries(&raw),
      None => Ok(Vec::new()),
    }
  }

  async fn save(&self, entries: &[RecentlyViewedEntry]) -> Result<()> {
    let raw = serde_json::to_string(entries)?;
    self
      .storage
      .set(RECENTLY_VIEWED_KEY, raw)
      .await
      .map_err(|e| Error::Storage(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::service::tests::summary;

  fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
  }

  fn store() -> RecentlyViewed<MemoryStorage> {
    RecentlyViewed::new(MemoryStorage::default())
  }

  fn ids(entries: &[RecentlyViewedEntry]) -> Vec<i64> {
    entries.iter().map(|e| e.discovery_id).collect()
  }

  /// Storage whose every call fails.
  struct BrokenStorage;

  impl LocalStorage for BrokenStorage {
    type Error = Error;

    async fn get(&self, _: &str) -> Result<Option<String>> {
      Err(Error::Storage("disk on fire".into()))
    }

    async fn set(&self, _: &str, _: String) -> Result<()> {
      Err(Error::Storage("disk on fire".into()))
    }

    async fn remove(&self, _: &str) -> Result<()> {
      Err(Error::Storage("disk on fire".into()))
    }
  }

  #[tokio::test]
  async fn newest_view_comes_first() {
    let s = store();
    s.record_view_at(&summary(1, 10), t(0)).await;
    s.record_view_at(&summary(2, 10), t(1)).await;
    s.record_view_at(&summary(3, 10), t(2)).await;
    assert_eq!(ids(&s.list_views().await), vec![3, 2, 1]);
  }

  #[tokio::test]
  async fn eleventh_view_evicts_the_oldest() {
    let s = store();
    for id in 1..=11 {
      s.record_view_at(&summary(id, 10), t(id)).await;
    }
    let entries = s.list_views().await;
    assert_eq!(entries.len(), MAX_RECENT);
    assert_eq!(entries[0].discovery_id, 11);
    assert!(!ids(&entries).contains(&1));
  }

  #[tokio::test]
  async fn re_viewing_moves_to_front_without_duplicating() {
    let s = store();
    s.record_view_at(&summary(1, 10), t(0)).await;
    s.record_view_at(&summary(2, 10), t(1)).await;
    s.record_view_at(&summary(1, 10), t(5)).await;

    let entries = s.list_views().await;
    assert_eq!(ids(&entries), vec![1, 2]);
    assert_eq!(entries[0].viewed_at, t(5));
  }

  #[tokio::test]
  async fn remove_missing_id_is_a_no_op() {
    let s = store();
    s.record_view_at(&summary(1, 10), t(0)).await;
    let before = s.storage().get(RECENTLY_VIEWED_KEY).await.unwrap();

    let after = s.remove_view(99).await;
    assert_eq!(ids(&after), vec![1]);
    assert_eq!(s.storage().get(RECENTLY_VIEWED_KEY).await.unwrap(), before);
  }

  #[tokio::test]
  async fn remove_existing_id() {
    let s = store();
    s.record_view_at(&summary(1, 10), t(0)).await;
    s.record_view_at(&summary(2, 10), t(1)).await;
    assert_eq!(ids(&s.remove_view(1).await), vec![2]);
    assert_eq!(ids(&s.list_views().await), vec![2]);
  }

  #[tokio::test]
  async fn corrupt_storage_reads_as_empty() {
    let s = store();
    s.storage()
      .set(RECENTLY_VIEWED_KEY, "{not json".into())
      .await
      .unwrap();
    assert!(s.list_views().await.is_empty());

    // Recording over corrupt data starts a fresh list.
    s.record_view_at(&summary(4, 10), t(0)).await;
    assert_eq!(ids(&s.list_views().await), vec![4]);
  }

  #[tokio::test]
  async fn incomplete_entries_are_dropped() {
    let s = store();
    let raw = serde_json::json!([
      {
        "discovery_id": 1, "bill_id": "1-08", "bill_title": "Uno",
        "impact_count": 2, "max_relevance": 40, "state": "PENDING",
        "viewed_at": "2024-05-01T09:00:00Z"
      },
      { "discovery_id": 2, "bill_title": "Sin boletín", "viewed_at": "2024-05-01T09:05:00Z" },
      { "discovery_id": 3, "bill_id": "3-08", "bill_title": "Sin fecha" },
      { "discovery_id": 4, "bill_id": "4-08", "bill_title": "Cuatro", "viewed_at": "2024-05-01T09:10:00Z" },
      "garbage"
    ]);
    s.storage()
      .set(RECENTLY_VIEWED_KEY, raw.to_string())
      .await
      .unwrap();

    let entries = s.list_views().await;
    assert_eq!(ids(&entries), vec![4, 1]);
    assert_eq!(entries[1].tier(), ImpactTier::Medio);
    assert_eq!(entries[0].state, DiscoveryState::Pending);
  }

  #[tokio::test]
  async fn broken_storage_never_fails_the_caller() {
    let s = RecentlyViewed::new(BrokenStorage);
    s.record_view(&summary(1, 10)).await;
    assert!(s.list_views().await.is_empty());
    assert!(s.remove_view(1).await.is_empty());
    s.clear().await;
  }

  #[test]
  fn push_view_keeps_cap() {
    let mut entries = Vec::new();
    for id in 1..=4 {
      push_view(
        &mut entries,
        RecentlyViewedEntry::new((&summary(id, 10)).into(), t(id)),
        3,
      );
    }
    assert_eq!(ids(&entries), vec![4, 3, 2]);

    assert!(remove_entry(&mut entries, 3));
    assert!(!remove_entry(&mut entries, 3));
    assert_eq!(ids(&entries), vec![4, 2]);
  }

  #[test]
  fn refreshed_keeps_view_time() {
    let entry = RecentlyViewedEntry::new((&summary(1, 10)).into(), t(3));
    let mut current = summary(1, 75);
    current.impact_count = 4;
    current.state = DiscoveryState::Tracking;

    let r = entry.refreshed(&current);
    assert_eq!(r.viewed_at, t(3));
    assert_eq!(r.impact_count, 4);
    assert_eq!(r.tier(), ImpactTier::Alto);
    assert_eq!(r.state, DiscoveryState::Tracking);
  }
}
