//! Application state machine and event dispatcher.
//!
//! Reads (listings, details) are awaited inline. Mutations (track, discard,
//! delete, upload, advance time) run on spawned tasks and report back as a
//! [`Completion`]; while one is in flight `busy` is set and further mutation
//! keys are ignored.

use std::path::PathBuf;

use anyhow::Context as _;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use legalward_client::ApiClient;
use legalward_core::{
  dashboard::DashboardStats,
  discovery::{
    Deletion, DetectionResult, DiscoveryDetail, DiscoverySummary, DocumentDetail,
    DocumentSummary, TimeAdvance,
  },
  lifecycle::{Lifecycle, Outcome, Transition},
  recent::{LocalStorage, RecentlyViewed},
  service::DiscoveryService,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::{
  context::{DiscoveriesContext, SessionContext},
  refresh::{RefreshKind, RefreshSchedule},
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Dashboard,
  Pending,
  Tracking,
  Documents,
  DiscoveryDetail,
  DocumentDetail,
}

impl Screen {
  /// Top-level screens reachable with the number keys.
  pub const TABS: [Screen; 4] =
    [Screen::Dashboard, Screen::Pending, Screen::Tracking, Screen::Documents];

  pub fn title(self) -> &'static str {
    match self {
      Self::Dashboard => "Dashboard",
      Self::Pending => "Pending",
      Self::Tracking => "Tracking",
      Self::Documents => "Documents",
      Self::DiscoveryDetail => "Discovery",
      Self::DocumentDetail => "Document",
    }
  }
}

/// A mutation waiting for the user to confirm with `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
  DeleteDocument { id: i64, name: String },
}

/// The result of a mutation run off the UI task.
#[derive(Debug)]
pub enum Completion {
  Transition {
    id:         i64,
    transition: Transition,
    result:     legalward_client::Result<Outcome<legalward_client::Error>>,
  },
  Deleted {
    id:     i64,
    result: legalward_client::Result<Deletion>,
  },
  Detected(anyhow::Result<DetectionResult>),
  Advanced(legalward_client::Result<TimeAdvance>),
}

/// Senders the app uses to reach the event loop.
#[derive(Debug, Clone)]
pub struct Channels {
  pub refresh: UnboundedSender<RefreshKind>,
  pub done:    UnboundedSender<Completion>,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<R> {
  pub screen: Screen,

  /// Screen to return to when leaving a detail view.
  pub back: Screen,

  pub session: SessionContext,

  pub discoveries: DiscoveriesContext,

  pub documents: Vec<DocumentSummary>,

  pub stats: DashboardStats,

  /// Discovery shown on the detail screen.
  pub detail: Option<DiscoveryDetail>,

  /// Document shown on the document screen.
  pub document: Option<DocumentDetail>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Path being typed for an upload, when the prompt is open.
  pub upload_input: Option<String>,

  pub confirm: Option<Confirm>,

  /// Cursor position within the list on the current screen.
  pub list_cursor: usize,

  /// Scroll offset within a detail view.
  pub detail_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// A mutation is in flight.
  pub busy: bool,

  client:      ApiClient,
  recent:      RecentlyViewed<R>,
  credentials: Option<(String, String)>,
  schedule:    RefreshSchedule,
  channels:    Channels,
}

impl<R> App<R>
where
  R: LocalStorage + Clone + 'static,
{
  pub fn new(
    client: ApiClient,
    recent: RecentlyViewed<R>,
    credentials: Option<(String, String)>,
    schedule: RefreshSchedule,
    channels: Channels,
  ) -> Self {
    Self {
      screen: Screen::Dashboard,
      back: Screen::Dashboard,
      session: SessionContext::default(),
      discoveries: DiscoveriesContext::default(),
      documents: Vec::new(),
      stats: DashboardStats::default(),
      detail: None,
      document: None,
      filter: String::new(),
      filter_active: false,
      upload_input: None,
      confirm: None,
      list_cursor: 0,
      detail_scroll: 0,
      status_msg: String::new(),
      busy: false,
      client,
      recent,
      credentials,
      schedule,
      channels,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Check the session (signing in with the configured credentials when
  /// nobody is), load everything and start the refresh task.
  pub async fn start(&mut self) {
    self.session = SessionContext::load(&self.client).await;
    if !self.session.session.is_authenticated()
      && let Some((email, password)) = self.credentials.clone()
    {
      self.login(&email, &password).await;
    }
    self.reload().await;
    self
      .discoveries
      .start(self.schedule.spawn(self.channels.refresh.clone()));
  }

  async fn login(&mut self, email: &str, password: &str) {
    match self.session.login(&self.client, email, password).await {
      Ok(()) => self.status_msg = format!("Signed in as {}", self.session.label()),
      Err(e) => {
        error!(error = %e, "login failed");
        self.status_msg = format!("Login failed: {e}");
      }
    }
  }

  /// Reload documents and both discovery listings, then the dashboard.
  pub async fn reload(&mut self) {
    self.status_msg = "Loading…".into();
    match self.client.list_documents().await {
      Ok(documents) => self.documents = documents,
      Err(e) => {
        error!(error = %e, "could not load documents");
        self.status_msg = format!("Error: {e}");
      }
    }
    let lifecycle = Lifecycle::new(&self.client, &self.recent);
    match lifecycle.reload().await {
      Ok(lists) => {
        self.discoveries.set_lists(lists);
        if self.status_msg.starts_with("Loading") {
          self.status_msg.clear();
        }
      }
      Err(e) => {
        error!(error = %e, "could not load discoveries");
        self.discoveries.set_error(e.to_string());
        self.status_msg = format!("Error: {e}");
      }
    }
    self.refresh_stats().await;
    self.clamp_cursor();
  }

  /// Recompute the dashboard from the loaded listings and local storage.
  pub async fn refresh_stats(&mut self) {
    let recent = self.recent.list_views().await;
    self.stats = DashboardStats::compute(
      &self.documents,
      &self.discoveries.lists.pending,
      &self.discoveries.lists.tracking,
      &recent,
    );
  }

  /// Handle a message from the refresh task or a focus change.
  pub async fn on_refresh(&mut self, kind: RefreshKind) {
    match kind {
      RefreshKind::PendingCount => {
        if let Err(e) = self.discoveries.refresh_pending(&self.client).await {
          warn!(error = %e, "pending refresh failed");
          return;
        }
        self.refresh_stats().await;
        self.clamp_cursor();
      }
      RefreshKind::RecentViews => self.refresh_stats().await,
    }
  }

  /// Stop background work. Called once when the event loop exits.
  pub fn shutdown(&mut self) { self.discoveries.clear(); }

}

impl<R> App<R> {
  // ── Lists ─────────────────────────────────────────────────────────────────

  /// Discoveries listed on `screen`, narrowed by the filter.
  pub fn filtered(&self, screen: Screen) -> Vec<&DiscoverySummary> {
    let source = match screen {
      Screen::Pending => &self.discoveries.lists.pending,
      Screen::Tracking => &self.discoveries.lists.tracking,
      _ => return Vec::new(),
    };
    if self.filter.is_empty() {
      return source.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    source
      .iter()
      .filter(|d| {
        matcher.fuzzy_match(&d.bill_title, &self.filter).is_some()
          || matcher.fuzzy_match(&d.bill_id, &self.filter).is_some()
      })
      .collect()
  }

  /// The discovery under the cursor on the current list screen.
  pub fn cursor_discovery(&self) -> Option<&DiscoverySummary> {
    self.filtered(self.screen).get(self.list_cursor).copied()
  }

  fn list_len(&self) -> usize {
    match self.screen {
      Screen::Dashboard => self.stats.recent.len(),
      Screen::Pending | Screen::Tracking => self.filtered(self.screen).len(),
      Screen::Documents => self.documents.len(),
      Screen::DiscoveryDetail => self.detail.as_ref().map_or(0, |d| d.impacts.len()),
      Screen::DocumentDetail => self.document.as_ref().map_or(0, |d| d.discoveries.len()),
    }
  }

  fn clamp_cursor(&mut self) {
    let len = self.list_len();
    if self.list_cursor >= len {
      self.list_cursor = len.saturating_sub(1);
    }
  }

  fn switch_to(&mut self, screen: Screen) {
    self.screen = screen;
    self.list_cursor = 0;
    self.detail_scroll = 0;
    self.filter.clear();
    self.filter_active = false;
  }

}

impl<R> App<R>
where
  R: LocalStorage + Clone + 'static,
{
  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.upload_input.is_some() {
      self.handle_upload_key(key);
      return Ok(true);
    }
    if self.confirm.is_some() {
      self.handle_confirm_key(key);
      return Ok(true);
    }
    if self.filter_active {
      self.handle_filter_key(key).await;
      return Ok(true);
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Char(c @ '1'..='4') => {
        let idx = c as usize - '1' as usize;
        self.switch_to(Screen::TABS[idx]);
      }
      KeyCode::Char('r') => self.reload().await,
      KeyCode::Char('u') => self.upload_input = Some(String::new()),
      KeyCode::Char('a') => self.advance_time(),
      KeyCode::Char('L') => self.toggle_session().await,
      _ => match self.screen {
        Screen::Dashboard => self.handle_dashboard_key(key).await,
        Screen::Pending | Screen::Tracking => self.handle_list_key(key).await,
        Screen::Documents => self.handle_documents_key(key).await,
        Screen::DiscoveryDetail | Screen::DocumentDetail => self.handle_detail_key(key),
      },
    }
    Ok(true)
  }

  fn move_cursor(&mut self, key: KeyCode) {
    let len = self.list_len();
    match key {
      KeyCode::Down | KeyCode::Char('j') if self.list_cursor + 1 < len => {
        self.list_cursor += 1;
      }
      KeyCode::Up | KeyCode::Char('k') if self.list_cursor > 0 => {
        self.list_cursor -= 1;
      }
      _ => {}
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Open the detail straight away when exactly one discovery matches.
        let only = match self.filtered(self.screen).as_slice() {
          [one] => Some(one.id),
          _ => None,
        };
        if let Some(id) = only {
          self.open_discovery(id).await;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_upload_key(&mut self, key: KeyEvent) {
    let Some(input) = self.upload_input.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.upload_input = None,
      KeyCode::Enter => {
        let path = input.trim().to_string();
        self.upload_input = None;
        if !path.is_empty() {
          self.upload(PathBuf::from(path));
        }
      }
      KeyCode::Backspace => {
        input.pop();
      }
      KeyCode::Char(c) => input.push(c),
      _ => {}
    }
  }

  fn handle_confirm_key(&mut self, key: KeyEvent) {
    let Some(confirm) = self.confirm.take() else {
      return;
    };
    match (key.code, confirm) {
      (KeyCode::Char('y' | 'Y'), Confirm::DeleteDocument { id, .. }) => {
        self.delete_document(id);
      }
      _ => self.status_msg = "Cancelled".into(),
    }
  }

  async fn handle_dashboard_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.stats.recent.get(self.list_cursor).map(|e| e.discovery_id) {
          self.open_discovery(id).await;
        }
      }
      code => self.move_cursor(code),
    }
  }

  async fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_discovery().map(|d| d.id) {
          self.open_discovery(id).await;
        }
      }
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('t') => {
        if let Some(id) = self.cursor_discovery().map(|d| d.id) {
          self.transition(id, Transition::Track);
        }
      }
      KeyCode::Char('d') => {
        if let Some(id) = self.cursor_discovery().map(|d| d.id) {
          self.transition(id, Transition::Discard);
        }
      }
      code => self.move_cursor(code),
    }
  }

  async fn handle_documents_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.documents.get(self.list_cursor).map(|d| d.id) {
          self.open_document(id).await;
        }
      }
      KeyCode::Char('x') | KeyCode::Delete => {
        if let Some(doc) = self.documents.get(self.list_cursor) {
          self.confirm = Some(Confirm::DeleteDocument { id: doc.id, name: doc.name.clone() });
        }
      }
      code => self.move_cursor(code),
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        let back = self.back;
        self.detail = None;
        self.document = None;
        self.switch_to(back);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.detail_scroll + 1 < self.list_len() {
          self.detail_scroll += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
      }
      KeyCode::Char(c @ ('t' | 'd')) if self.screen == Screen::DiscoveryDetail => {
        let transition = if c == 't' { Transition::Track } else { Transition::Discard };
        if let Some(id) = self.detail.as_ref().map(|d| d.id) {
          self.transition(id, transition);
        }
      }
      _ => {}
    }
  }

  // ── Detail views ──────────────────────────────────────────────────────────

  /// Load the detail of `id`, record the view and show it.
  async fn open_discovery(&mut self, id: i64) {
    self.status_msg = "Loading…".into();
    match self.client.discovery_detail(id).await {
      Ok(detail) => {
        self.recent.record_view(&detail).await;
        self.detail = Some(detail);
        if !matches!(self.screen, Screen::DiscoveryDetail | Screen::DocumentDetail) {
          self.back = self.screen;
        }
        self.screen = Screen::DiscoveryDetail;
        self.detail_scroll = 0;
        self.status_msg.clear();
      }
      Err(e) => {
        error!(id, error = %e, "could not load discovery");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  async fn open_document(&mut self, id: i64) {
    self.status_msg = "Loading…".into();
    match self.client.document_detail(id).await {
      Ok(document) => {
        self.document = Some(document);
        self.back = Screen::Documents;
        self.screen = Screen::DocumentDetail;
        self.detail_scroll = 0;
        self.status_msg.clear();
      }
      Err(e) => {
        error!(id, error = %e, "could not load document");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  // ── Session ───────────────────────────────────────────────────────────────

  async fn toggle_session(&mut self) {
    if self.session.session.is_authenticated() {
      let result = self.session.logout(&self.client).await;
      self.discoveries.clear();
      self.documents.clear();
      self.detail = None;
      self.document = None;
      self.refresh_stats().await;
      self.switch_to(Screen::Dashboard);
      self.status_msg = match result {
        Ok(()) => "Signed out".into(),
        Err(e) => format!("Signed out locally (logout request failed: {e})"),
      };
      return;
    }
    let Some((email, password)) = self.credentials.clone() else {
      self.status_msg = "No credentials configured (--email/--password)".into();
      return;
    };
    self.login(&email, &password).await;
    if self.session.session.is_authenticated() {
      self.reload().await;
      if !self.discoveries.is_refreshing() {
        self
          .discoveries
          .start(self.schedule.spawn(self.channels.refresh.clone()));
      }
    }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Mark a mutation as started. Returns `false` if one is already running.
  fn begin(&mut self, label: &str) -> bool {
    if self.busy {
      self.status_msg = "Busy: wait for the current request to finish".into();
      return false;
    }
    self.busy = true;
    self.status_msg = format!("{label}…");
    true
  }

  fn transition(&mut self, id: i64, transition: Transition) {
    let current = self
      .discoveries
      .lists
      .find(id)
      .map(|d| d.state)
      .or_else(|| self.detail.as_ref().filter(|d| d.id == id).map(|d| d.state));
    if let Some(from) = current {
      match transition.apply(from) {
        Err(e) => {
          warn!(id, error = %e, "requesting transition the client considers invalid");
        }
        Ok(_) if from.is_terminal() => info!(id, state = %from, "repeating transition"),
        Ok(_) => {}
      }
    }
    let label = match transition {
      Transition::Track => "Tracking",
      Transition::Discard => "Discarding",
    };
    if !self.begin(label) {
      return;
    }
    let client = self.client.clone();
    let recent = self.recent.clone();
    let done = self.channels.done.clone();
    tokio::spawn(async move {
      let lifecycle = Lifecycle::new(&client, &recent);
      let result = match transition {
        Transition::Track => lifecycle.track(id).await,
        Transition::Discard => lifecycle.discard(id).await,
      };
      done.send(Completion::Transition { id, transition, result }).ok();
    });
  }

  fn delete_document(&mut self, id: i64) {
    if !self.begin("Deleting document") {
      return;
    }
    let client = self.client.clone();
    let done = self.channels.done.clone();
    tokio::spawn(async move {
      let result = client.delete_document(id).await;
      done.send(Completion::Deleted { id, result }).ok();
    });
  }

  fn upload(&mut self, path: PathBuf) {
    if !self.begin("Uploading") {
      return;
    }
    let client = self.client.clone();
    let done = self.channels.done.clone();
    tokio::spawn(async move {
      done.send(Completion::Detected(upload_file(&client, &path).await)).ok();
    });
  }

  fn advance_time(&mut self) {
    if !self.begin("Advancing time") {
      return;
    }
    let client = self.client.clone();
    let done = self.channels.done.clone();
    tokio::spawn(async move {
      done.send(Completion::Advanced(client.advance_time().await)).ok();
    });
  }

  /// Apply the result of a finished mutation.
  pub async fn complete(&mut self, completion: Completion) {
    self.busy = false;
    match completion {
      Completion::Transition { id, transition, result } => match result {
        Ok(outcome) => {
          if let Some(detail) = self.detail.as_mut().filter(|d| d.id == id) {
            detail.state = outcome.change.state;
          }
          self.status_msg = if outcome.change.message.is_empty() {
            format!("Discovery {id}: {}", outcome.change.state)
          } else {
            outcome.change.message
          };
          match outcome.lists {
            Ok(lists) => self.discoveries.set_lists(lists),
            Err(e) => {
              self.discoveries.set_error(e.to_string());
              self.status_msg =
                format!("{} (could not reload discoveries: {e})", self.status_msg);
            }
          }
          self.refresh_stats().await;
          self.clamp_cursor();
        }
        Err(e) => {
          self.status_msg = format!("Could not {transition} discovery {id}: {e}");
        }
      },
      Completion::Deleted { id, result } => match result {
        Ok(deletion) => {
          info!(id, "document deleted");
          self.status_msg = deletion.message;
          self.reload().await;
        }
        Err(e) => {
          error!(id, error = %e, "document deletion failed");
          self.status_msg = format!("Could not delete document {id}: {e}");
        }
      },
      Completion::Detected(result) => match result {
        Ok(detection) => {
          let message = format!(
            "{}: {} discoveries, {} pending",
            detection.document_name,
            detection.discoveries.len(),
            detection.pending_count
          );
          self.reload().await;
          self.status_msg = message;
        }
        Err(e) => {
          error!(error = %e, "upload failed");
          self.status_msg = format!("Upload failed: {e:#}");
        }
      },
      Completion::Advanced(result) => match result {
        Ok(advance) => {
          self.reload().await;
          self.status_msg =
            format!("{} ({} bills advanced)", advance.message, advance.bills_advanced);
        }
        Err(e) => {
          error!(error = %e, "advance time failed");
          self.status_msg = format!("Could not advance time: {e}");
        }
      },
    }
  }
}

/// Read `path` and submit it for conflict detection.
pub async fn upload_file(
  client: &ApiClient,
  path: &std::path::Path,
) -> anyhow::Result<DetectionResult> {
  let contents = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "document".to_string());
  Ok(client.detect(file_name, contents).await?)
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use legalward_client::ApiConfig;
  use legalward_core::{
    discovery::StateChange,
    lifecycle::{DiscoveryLists, DiscoveryState},
    recent::MemoryStorage,
    tier::Relevance,
  };
  use tokio::sync::mpsc;

  use super::*;

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn summary(id: i64, title: &str) -> DiscoverySummary {
    DiscoverySummary {
      id,
      bill_id: format!("{id}-07"),
      bill_title: title.into(),
      impact_summary: None,
      analyzed_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
      impact_count: 1,
      max_relevance: Relevance::new(40).unwrap(),
      document_id: 1,
      document_name: "contrato.pdf".into(),
      state: DiscoveryState::Pending,
      bill: None,
    }
  }

  fn app() -> (App<MemoryStorage>, mpsc::UnboundedReceiver<Completion>) {
    let (refresh, _) = mpsc::unbounded_channel();
    let (done, done_rx) = mpsc::unbounded_channel();
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      ..ApiConfig::default()
    })
    .unwrap();
    let mut app = App::new(
      client,
      RecentlyViewed::new(MemoryStorage::default()),
      None,
      RefreshSchedule::default(),
      Channels { refresh, done },
    );
    app.discoveries.set_lists(DiscoveryLists {
      pending:  vec![
        summary(1, "Ley de protección de datos"),
        summary(2, "Reforma tributaria"),
        summary(3, "Ley de pesca"),
      ],
      tracking: vec![],
    });
    (app, done_rx)
  }

  #[tokio::test]
  async fn number_keys_switch_screens() {
    let (mut app, _rx) = app();
    assert!(app.handle_key(key(KeyCode::Char('2'))).await.unwrap());
    assert_eq!(app.screen, Screen::Pending);
    assert!(app.handle_key(key(KeyCode::Char('4'))).await.unwrap());
    assert_eq!(app.screen, Screen::Documents);
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
  }

  #[tokio::test]
  async fn filter_narrows_pending_list() {
    let (mut app, _rx) = app();
    app.switch_to(Screen::Pending);
    app.handle_key(key(KeyCode::Char('/'))).await.unwrap();
    for c in "pesca".chars() {
      app.handle_key(key(KeyCode::Char(c))).await.unwrap();
    }
    let ids: Vec<_> = app.filtered(Screen::Pending).iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![3]);

    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert_eq!(app.filtered(Screen::Pending).len(), 3);
  }

  #[tokio::test]
  async fn cursor_stays_in_bounds() {
    let (mut app, _rx) = app();
    app.switch_to(Screen::Pending);
    for _ in 0..5 {
      app.handle_key(key(KeyCode::Down)).await.unwrap();
    }
    assert_eq!(app.list_cursor, 2);
    assert_eq!(app.cursor_discovery().map(|d| d.id), Some(3));
  }

  #[tokio::test]
  async fn second_mutation_is_ignored_while_busy() {
    let (mut app, _rx) = app();
    app.switch_to(Screen::Pending);
    app.busy = true;
    app.handle_key(key(KeyCode::Char('t'))).await.unwrap();
    assert!(app.status_msg.starts_with("Busy"));
  }

  #[tokio::test]
  async fn failed_transition_leaves_lists_untouched() {
    let (mut app, _rx) = app();
    app.busy = true;
    let before = app.discoveries.lists.clone();
    let err = legalward_client::Error::Status {
      endpoint: "POST /discoveries/{id}/track".into(),
      status:   500,
      body:     "boom".into(),
    };
    app
      .complete(Completion::Transition { id: 1, transition: Transition::Track, result: Err(err) })
      .await;

    assert!(!app.busy);
    assert_eq!(app.discoveries.lists, before);
    assert!(app.status_msg.contains("Could not track discovery 1"));
  }

  #[tokio::test]
  async fn confirmed_transition_replaces_lists() {
    let (mut app, _rx) = app();
    app.busy = true;
    let tracked = DiscoverySummary { state: DiscoveryState::Tracking, ..summary(1, "x") };
    let outcome = Outcome {
      change: StateChange {
        success: true,
        message: "Proyecto en seguimiento".into(),
        state:   DiscoveryState::Tracking,
      },
      lists:  Ok(DiscoveryLists {
        pending:  vec![summary(2, "y"), summary(3, "z")],
        tracking: vec![tracked],
      }),
    };
    app
      .complete(Completion::Transition { id: 1, transition: Transition::Track, result: Ok(outcome) })
      .await;

    assert_eq!(app.discoveries.pending_count(), 2);
    assert_eq!(app.stats.tracking_count, 1);
    assert_eq!(app.status_msg, "Proyecto en seguimiento");
  }

  #[tokio::test]
  async fn confirmed_transition_survives_failed_reload() {
    let (mut app, _rx) = app();
    app.busy = true;
    let before = app.discoveries.lists.clone();
    let outcome = Outcome {
      change: StateChange {
        success: true,
        message: "Descubrimiento descartado".into(),
        state:   DiscoveryState::Discarded,
      },
      lists:  Err(legalward_client::Error::Status {
        endpoint: "GET /discoveries".into(),
        status:   502,
        body:     "bad gateway".into(),
      }),
    };
    app
      .complete(Completion::Transition { id: 1, transition: Transition::Discard, result: Ok(outcome) })
      .await;

    assert!(!app.busy);
    assert!(app.status_msg.starts_with("Descubrimiento descartado"));
    assert!(app.status_msg.contains("could not reload discoveries"));
    assert!(!app.status_msg.contains("Could not discard"));
    assert!(app.discoveries.error.is_some());
    assert_eq!(app.discoveries.lists, before);
  }

  #[tokio::test]
  async fn detail_view_sends_repeated_track() {
    let (mut app, _rx) = app();
    app.detail = Some(DiscoveryDetail {
      id:             5,
      bill_id:        "5-07".into(),
      bill_title:     "Ley de pesca".into(),
      impact_summary: None,
      analyzed_at:    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
      state:          DiscoveryState::Tracking,
      max_relevance:  Relevance::new(60).unwrap(),
      document:       DocumentSummary {
        id:              1,
        name:            "contrato.pdf".into(),
        uploaded_at:     Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        discovery_count: 1,
      },
      impacts:        vec![],
    });
    app.screen = Screen::DiscoveryDetail;

    app.handle_key(key(KeyCode::Char('t'))).await.unwrap();
    assert!(app.busy);
    assert_eq!(app.status_msg, "Tracking…");
  }

  #[tokio::test]
  async fn delete_asks_for_confirmation() {
    let (mut app, _rx) = app();
    app.documents = vec![DocumentSummary {
      id:              7,
      name:            "contrato.pdf".into(),
      uploaded_at:     Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
      discovery_count: 2,
    }];
    app.switch_to(Screen::Documents);
    app.handle_key(key(KeyCode::Char('x'))).await.unwrap();
    assert_eq!(
      app.confirm,
      Some(Confirm::DeleteDocument { id: 7, name: "contrato.pdf".into() })
    );

    app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
    assert_eq!(app.confirm, None);
    assert!(!app.busy);
    assert_eq!(app.status_msg, "Cancelled");
  }
}
