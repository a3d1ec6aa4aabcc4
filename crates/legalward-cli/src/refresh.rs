//! Periodic refresh triggers for the dashboard.
//!
//! A [`RefreshSchedule`] spawns a tokio task that emits [`RefreshKind`]
//! messages on a channel read by the event loop. The returned
//! [`RefreshHandle`] stops the task when cancelled or dropped.

use std::time::Duration;

use tokio::{
  sync::mpsc::UnboundedSender,
  task::JoinHandle,
  time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

/// What the event loop should reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
  /// The pending listing that backs the pending-count badge.
  PendingCount,
  /// The recently-viewed panel, re-read from local storage.
  RecentViews,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
  pub pending_every: Duration,
}

impl Default for RefreshSchedule {
  fn default() -> Self {
    Self { pending_every: Duration::from_secs(30) }
  }
}

impl RefreshSchedule {
  /// Start emitting [`RefreshKind::PendingCount`] every `pending_every`.
  /// The first tick fires one full period after the call.
  pub fn spawn(&self, tx: UnboundedSender<RefreshKind>) -> RefreshHandle {
    let period = self.pending_every;
    let task = tokio::spawn(async move {
      let mut ticks = interval_at(Instant::now() + period, period);
      ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticks.tick().await;
        if tx.send(RefreshKind::PendingCount).is_err() {
          debug!("refresh receiver closed");
          break;
        }
      }
    });
    RefreshHandle { task }
  }
}

/// Owner of a running refresh task.
#[derive(Debug)]
pub struct RefreshHandle {
  task: JoinHandle<()>,
}

impl RefreshHandle {
  pub fn cancel(&self) { self.task.abort(); }
}

impl Drop for RefreshHandle {
  fn drop(&mut self) { self.task.abort(); }
}
