//! Dashboard statistics assembled from the remote listings and the local
//! recently-viewed cache.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
  discovery::{DiscoverySummary, DocumentSummary},
  recent::RecentlyViewedEntry,
};

/// Number of recently viewed discoveries shown on the dashboard.
pub const RECENT_PANEL_SIZE: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
  pub document_count:    usize,
  pub pending_count:     usize,
  pub tracking_count:    usize,
  /// Pending and tracked discoveries at or above the high-impact threshold.
  pub high_impact_count: usize,
  /// Recently viewed discoveries that are still pending or tracked, newest
  /// first, refreshed with their current listing data.
  pub recent:            Vec<RecentlyViewedEntry>,
}

impl DashboardStats {
  pub fn compute(
    documents: &[DocumentSummary],
    pending: &[DiscoverySummary],
    tracking: &[DiscoverySummary],
    recent: &[RecentlyViewedEntry],
  ) -> Self {
    let active: HashMap<i64, &DiscoverySummary> = pending
      .iter()
      .chain(tracking)
      .map(|d| (d.id, d))
      .collect();

    let high_impact_count = pending
      .iter()
      .chain(tracking)
      .filter(|d| d.max_relevance.is_high_impact())
      .count();

    let mut recent: Vec<_> = recent
      .iter()
      .filter_map(|entry| {
        active
          .get(&entry.discovery_id)
          .map(|current| entry.refreshed(current))
      })
      .collect();
    recent.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
    recent.truncate(RECENT_PANEL_SIZE);

    Self {
      document_count: documents.len(),
      pending_count: pending.len(),
      tracking_count: tracking.len(),
      high_impact_count,
      recent,
    }
  }
}
