//! Long-lived state shared by every screen: the signed-in session and the
//! discovery listings with their refresh task.

use legalward_client::ApiClient;
use legalward_core::{
  lifecycle::DiscoveryLists,
  service::DiscoveryService,
  session::{LoginMethods, Session},
};
use tracing::{info, warn};

use crate::refresh::RefreshHandle;

// ─── Session ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SessionContext {
  pub session: Session,
  pub methods: LoginMethods,
}

impl SessionContext {
  /// Ask the backend who is signed in. Failures read as anonymous.
  pub async fn load(client: &ApiClient) -> Self {
    let session = client.session().await.unwrap_or_else(|e| {
      warn!(error = %e, "session check failed");
      Session::Anonymous
    });
    let methods = client.login_methods().await.unwrap_or_else(|e| {
      warn!(error = %e, "could not read login configuration");
      LoginMethods::default()
    });
    Self { session, methods }
  }

  pub async fn login(
    &mut self,
    client: &ApiClient,
    email: &str,
    password: &str,
  ) -> legalward_client::Result<()> {
    self.session = client.login(email, password).await?;
    Ok(())
  }

  /// End the session. The local session is cleared whatever the backend
  /// answers; a failed request is still returned for display.
  pub async fn logout(&mut self, client: &ApiClient) -> legalward_client::Result<()> {
    let result = client.logout().await;
    if let Err(e) = &result {
      warn!(error = %e, "logout request failed, signing out locally");
    }
    self.clear();
    result
  }

  pub fn clear(&mut self) { self.session = Session::Anonymous; }

  /// Name shown in the header.
  pub fn label(&self) -> &str {
    self
      .session
      .user()
      .map(|u| u.display.as_str())
      .unwrap_or("anonymous")
  }
}

// ─── Discoveries ──────────────────────────────────────────────────────────────

/// The pending and tracking listings plus the task that keeps the pending
/// count fresh.
#[derive(Debug, Default)]
pub struct DiscoveriesContext {
  pub lists: DiscoveryLists,
  /// Message from the last failed load, shown instead of the listings.
  pub error: Option<String>,
  refresh:   Option<RefreshHandle>,
}

impl DiscoveriesContext {
  pub fn pending_count(&self) -> usize { self.lists.pending.len() }

  pub fn is_refreshing(&self) -> bool { self.refresh.is_some() }

  /// Attach the refresh task, replacing (and cancelling) any previous one.
  pub fn start(&mut self, handle: RefreshHandle) {
    self.refresh = Some(handle);
  }

  pub fn set_lists(&mut self, lists: DiscoveryLists) {
    self.lists = lists;
    self.error = None;
  }

  pub fn set_error(&mut self, message: String) {
    self.error = Some(message);
  }

  /// Reload the pending listing only. The tracking listing is left as is.
  pub async fn refresh_pending<S: DiscoveryService>(
    &mut self,
    service: &S,
  ) -> Result<(), S::Error> {
    let pending = service.list_pending().await?;
    if pending.len() != self.lists.pending.len() {
      info!(
        before = self.lists.pending.len(),
        after = pending.len(),
        "pending count changed"
      );
    }
    self.lists.pending = pending;
    Ok(())
  }

  /// Stop refreshing and forget the listings.
  pub fn clear(&mut self) {
    if let Some(handle) = self.refresh.take() {
      handle.cancel();
    }
    self.lists = DiscoveryLists::default();
    self.error = None;
  }
}
