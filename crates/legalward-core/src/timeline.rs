//! Legislative timeline derived from a bill's stage.
//!
//! A bill moves through four fixed milestones. The stage reported by the
//! service says which one is current; milestones before it are complete and
//! get a projected date counted from the bill's introduction date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// The four milestones of the legislative process, in order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, Display, EnumIter,
)]
pub enum Stage {
  #[strum(serialize = "Ingreso")]
  Ingreso,
  #[strum(serialize = "Primera Cámara")]
  PrimeraCamara,
  #[strum(serialize = "Segunda Cámara")]
  SegundaCamara,
  #[strum(serialize = "Promulgación")]
  Promulgacion,
}

impl Stage {
  /// 1-based position in the legislative process.
  pub fn index(self) -> i32 {
    match self {
      Self::Ingreso => 1,
      Self::PrimeraCamara => 2,
      Self::SegundaCamara => 3,
      Self::Promulgacion => 4,
    }
  }

  /// Days between the bill's introduction and this milestone.
  pub fn offset_days(self) -> u64 {
    match self {
      Self::Ingreso => 0,
      Self::PrimeraCamara => 45,
      Self::SegundaCamara => 120,
      Self::Promulgacion => 180,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MilestoneStatus {
  Pending,
  InProgress,
  Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
  pub stage:  Stage,
  pub status: MilestoneStatus,
  /// Only set for completed milestones of a bill with a known introduction
  /// date.
  pub date:   Option<NaiveDate>,
}

/// The derived, never-persisted timeline of one bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
  pub milestones: Vec<Milestone>,
}

impl Timeline {
  /// The milestone currently in progress.
  pub fn current(&self) -> Option<&Milestone> {
    self
      .milestones
      .iter()
      .find(|m| m.status == MilestoneStatus::InProgress)
  }
}

/// Derive the timeline for a bill at `stage`, introduced on `reference`.
///
/// A missing stage means the bill has just been introduced. Stages outside
/// `1..=4` are clamped into that range.
pub fn derive_timeline(
  stage: Option<i32>,
  reference: Option<NaiveDate>,
) -> Timeline {
  let stage = stage.unwrap_or(1).clamp(1, 4);

  let milestones = Stage::iter()
    .map(|milestone| {
      let i = milestone.index();
      let status = match stage.cmp(&i) {
        std::cmp::Ordering::Greater => MilestoneStatus::Completed,
        std::cmp::Ordering::Equal => MilestoneStatus::InProgress,
        std::cmp::Ordering::Less => MilestoneStatus::Pending,
      };
      let date = match status {
        MilestoneStatus::Completed => reference
          .and_then(|d| d.checked_add_days(Days::new(milestone.offset_days()))),
        _ => None,
      };
      Milestone { stage: milestone, status, date }
    })
    .collect();

  Timeline { milestones }
}

/// Whole days elapsed from `since` to `today`; negative if `since` is in the
/// future.
pub fn days_since(since: NaiveDate, today: NaiveDate) -> i64 {
  (today - since).num_days()
}
