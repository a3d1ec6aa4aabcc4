//! The `DiscoveryService` trait: the remote conflict-detection service as
//! seen by the client.
//!
//! The trait is implemented by `legalward-client` over HTTP. Higher layers
//! (the lifecycle model, the terminal dashboard) depend on this abstraction,
//! not on any concrete transport.

use std::future::Future;

use crate::discovery::{
  Deletion, DetectionResult, DiscoveryDetail, DiscoverySummary, DocumentDetail,
  DocumentSummary, StateChange, TimeAdvance,
};

/// Abstraction over the remote detection service.
///
/// Every method maps to one request. Implementations must not retry or cache;
/// callers reload listings after each confirmed mutation.
pub trait DiscoveryService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Upload a document for conflict detection.
  fn detect(
    &self,
    file_name: String,
    contents: Vec<u8>,
  ) -> impl Future<Output = Result<DetectionResult, Self::Error>> + Send + '_;

  fn list_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<DocumentSummary>, Self::Error>> + Send + '_;

  fn document_detail(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<DocumentDetail, Self::Error>> + Send + '_;

  /// Delete a document. Its discoveries are removed by the service.
  fn delete_document(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Deletion, Self::Error>> + Send + '_;

  // ── Discoveries ───────────────────────────────────────────────────────

  /// Discoveries still awaiting a decision.
  fn list_pending(
    &self,
  ) -> impl Future<Output = Result<Vec<DiscoverySummary>, Self::Error>> + Send + '_;

  /// Discoveries the user follows, with bill metadata.
  fn list_tracking(
    &self,
  ) -> impl Future<Output = Result<Vec<DiscoverySummary>, Self::Error>> + Send + '_;

  fn discovery_detail(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<DiscoveryDetail, Self::Error>> + Send + '_;

  fn track(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<StateChange, Self::Error>> + Send + '_;

  fn discard(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<StateChange, Self::Error>> + Send + '_;

  // ── Demo ──────────────────────────────────────────────────────────────

  /// Advance every tracked bill by one legislative stage.
  fn advance_time(
    &self,
  ) -> impl Future<Output = Result<TimeAdvance, Self::Error>> + Send + '_;
}
