//! Relevance percentages and the impact tier derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::Error;

/// Relevance at or above which a discovery counts as high impact.
pub const HIGH_IMPACT_THRESHOLD: u8 = 50;

/// Relevance at or above which a discovery is at least medium impact.
pub const MEDIUM_IMPACT_THRESHOLD: u8 = 30;

// ─── Relevance ───────────────────────────────────────────────────────────────

/// A relevance percentage in `0..=100`, as assigned by the detection service.
///
/// Out-of-range values are rejected when the server response is parsed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Relevance(u8);

impl Relevance {
  pub fn new(value: u8) -> crate::Result<Self> {
    Self::try_from(i64::from(value))
  }

  pub fn get(self) -> u8 { self.0 }

  pub fn tier(self) -> ImpactTier { ImpactTier::from_relevance(self) }

  pub fn is_high_impact(self) -> bool { self.0 >= HIGH_IMPACT_THRESHOLD }
}

impl TryFrom<i64> for Relevance {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    u8::try_from(value)
      .ok()
      .filter(|v| *v <= 100)
      .map(Self)
      .ok_or(Error::RelevanceOutOfRange(value))
  }
}

impl From<Relevance> for u8 {
  fn from(r: Relevance) -> Self { r.0 }
}

impl fmt::Display for Relevance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}%", self.0)
  }
}

// ─── ImpactTier ──────────────────────────────────────────────────────────────

/// Display-only classification of a relevance percentage.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum ImpactTier {
  Bajo,
  Medio,
  Alto,
}

impl ImpactTier {
  pub fn from_relevance(relevance: Relevance) -> Self {
    match relevance.get() {
      r if r >= HIGH_IMPACT_THRESHOLD => Self::Alto,
      r if r >= MEDIUM_IMPACT_THRESHOLD => Self::Medio,
      _ => Self::Bajo,
    }
  }
}
