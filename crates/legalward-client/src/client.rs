//! Async HTTP client wrapping the conflict-detector JSON API.

use std::time::Duration;

use legalward_core::{
  discovery::{
    Deletion, DetectionResult, DiscoveryDetail, DiscoverySummary,
    DocumentDetail, DocumentSummary, StateChange, TimeAdvance,
  },
  service::DiscoveryService,
};
use reqwest::{
  Client, RequestBuilder, Response,
  multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Prefix of every conflict-detector endpoint.
const API_PREFIX: &str = "/api/conflict-detector";

/// Connection settings for the LegalWard service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Scheme, host and port, e.g. `http://localhost:8000`.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000".to_string(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for the LegalWard REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] (and its cookie jar) is
/// `Arc`-based, so clones share one session.
#[derive(Clone)]
pub struct ApiClient {
  pub(crate) client: Client,
  base_url:          String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .cookie_store(true)
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn api_url(&self, path: &str) -> String {
    format!("{}{API_PREFIX}{path}", self.base_url)
  }

  pub(crate) fn auth_url(&self, path: &str) -> String {
    format!("{}/.auth/headless/browser/v1{path}", self.base_url)
  }

  /// Send `req` and decode a JSON body of type `T` from a 2xx response.
  async fn call<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    req: RequestBuilder,
  ) -> Result<T> {
    debug!(endpoint, "sending request");
    let resp = req.send().await?;
    let body = read_success(endpoint, resp).await?;
    decode(endpoint, &body)
  }
}

/// Read the body of `resp`, turning a non-success status into
/// [`Error::Status`] carrying the body text.
pub(crate) async fn read_success(endpoint: &str, resp: Response) -> Result<String> {
  let status = resp.status();
  let body = resp.text().await.unwrap_or_default();
  if !status.is_success() {
    warn!(endpoint, status = status.as_u16(), "request rejected");
    return Err(Error::Status {
      endpoint: endpoint.to_string(),
      status: status.as_u16(),
      body,
    });
  }
  Ok(body)
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
  serde_json::from_str(body).map_err(|source| Error::Decode {
    endpoint: endpoint.to_string(),
    source,
  })
}

// ─── DiscoveryService impl ───────────────────────────────────────────────────

impl DiscoveryService for ApiClient {
  type Error = Error;

  // ── Documents ─────────────────────────────────────────────────────────────

  /// `POST /detect` (multipart field `file`)
  async fn detect(&self, file_name: String, contents: Vec<u8>) -> Result<DetectionResult> {
    info!(file_name = %file_name, bytes = contents.len(), "uploading document for detection");
    let form = Form::new().part("file", Part::bytes(contents).file_name(file_name));
    let result: DetectionResult = self
      .call("POST /detect", self.client.post(self.api_url("/detect")).multipart(form))
      .await?;
    info!(
      document_id = result.document_id,
      discoveries = result.discoveries.len(),
      pending = result.pending_count,
      "detection complete"
    );
    Ok(result)
  }

  /// `GET /documents`
  async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
    self
      .call("GET /documents", self.client.get(self.api_url("/documents")))
      .await
  }

  /// `GET /documents/{id}`
  async fn document_detail(&self, id: i64) -> Result<DocumentDetail> {
    self
      .call(
        "GET /documents/{id}",
        self.client.get(self.api_url(&format!("/documents/{id}"))),
      )
      .await
  }

  /// `DELETE /documents/{id}`
  async fn delete_document(&self, id: i64) -> Result<Deletion> {
    info!(id, "deleting document");
    self
      .call(
        "DELETE /documents/{id}",
        self.client.delete(self.api_url(&format!("/documents/{id}"))),
      )
      .await
  }

  // ── Discoveries ───────────────────────────────────────────────────────────

  /// `GET /discoveries`
  async fn list_pending(&self) -> Result<Vec<DiscoverySummary>> {
    self
      .call("GET /discoveries", self.client.get(self.api_url("/discoveries")))
      .await
  }

  /// `GET /discoveries/tracking`
  async fn list_tracking(&self) -> Result<Vec<DiscoverySummary>> {
    self
      .call(
        "GET /discoveries/tracking",
        self.client.get(self.api_url("/discoveries/tracking")),
      )
      .await
  }

  /// `GET /discoveries/{id}`
  async fn discovery_detail(&self, id: i64) -> Result<DiscoveryDetail> {
    self
      .call(
        "GET /discoveries/{id}",
        self.client.get(self.api_url(&format!("/discoveries/{id}"))),
      )
      .await
  }

  /// `POST /discoveries/{id}/track`
  async fn track(&self, id: i64) -> Result<StateChange> {
    info!(id, "tracking discovery");
    self
      .call(
        "POST /discoveries/{id}/track",
        self.client.post(self.api_url(&format!("/discoveries/{id}/track"))),
      )
      .await
  }

  /// `POST /discoveries/{id}/discard`
  async fn discard(&self, id: i64) -> Result<StateChange> {
    info!(id, "discarding discovery");
    self
      .call(
        "POST /discoveries/{id}/discard",
        self.client.post(self.api_url(&format!("/discoveries/{id}/discard"))),
      )
      .await
  }

  // ── Demo ──────────────────────────────────────────────────────────────────

  /// `POST /demo/advance-time`
  async fn advance_time(&self) -> Result<TimeAdvance> {
    let result: TimeAdvance = self
      .call(
        "POST /demo/advance-time",
        self.client.post(self.api_url("/demo/advance-time")),
      )
      .await?;
    info!(bills_advanced = result.bills_advanced, "advanced legislative time");
    Ok(result)
  }
}
