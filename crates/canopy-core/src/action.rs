//! Climate actions: the candidates a city ranks.
//!
//! Mitigation and adaptation actions share a common set of details but carry
//! different type-specific fields. They are modelled as a tagged enum; the
//! `ActionType` tag on the wire selects the variant.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Action type ─────────────────────────────────────────────────────────────

/// The partition an action belongs to. Rankings are kept per city and type.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionType {
  Mitigation,
  Adaptation,
}

/// How effective an adaptation action is judged to be.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effectiveness {
  Low,
  Medium,
  High,
}

// ─── Details ─────────────────────────────────────────────────────────────────

/// Fields shared by every action.
///
/// `action_priority` is not public: it is assigned only by the re-ranking
/// functions in [`crate::ranking`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionDetails {
  #[serde(rename = "ActionID")]
  pub action_id:                   String,
  pub action_name:                 String,
  #[serde(default)]
  pub description:                 Option<String>,
  /// Categorical, e.g. "low", "medium", "high".
  #[serde(default)]
  pub cost_investment_needed:      Option<String>,
  /// Categorical, e.g. "<5 years", "5-10 years".
  #[serde(default)]
  pub timeline_for_implementation: Option<String>,
  #[serde(
    rename = "actionPriority",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  action_priority:                 Option<usize>,
}

impl ActionDetails {
  /// Details with every optional field empty and no priority assigned.
  pub fn new(action_id: impl Into<String>, action_name: impl Into<String>) -> Self {
    Self {
      action_id: action_id.into(),
      action_name: action_name.into(),
      description: None,
      cost_investment_needed: None,
      timeline_for_implementation: None,
      action_priority: None,
    }
  }
}

/// A mitigation action: reduces emissions in one or more sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationAction {
  #[serde(flatten)]
  pub details:                 ActionDetails,
  #[serde(rename = "Sector", default)]
  pub sector:                  BTreeSet<String>,
  /// Sector → estimated reduction as a percent range (e.g. "20-39"), or
  /// `None` when no estimate exists for that sector.
  #[serde(rename = "GHGReductionPotential", default)]
  pub ghg_reduction_potential: BTreeMap<String, Option<String>>,
}

/// An adaptation action: reduces exposure or sensitivity to hazards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationAction {
  #[serde(flatten)]
  pub details:                  ActionDetails,
  #[serde(rename = "Hazard", default)]
  pub hazard:                   BTreeSet<String>,
  #[serde(rename = "AdaptationEffectiveness", default)]
  pub adaptation_effectiveness: Option<Effectiveness>,
}

// ─── ClimateAction ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ActionType", rename_all = "lowercase")]
pub enum ClimateAction {
  Mitigation(MitigationAction),
  Adaptation(AdaptationAction),
}

impl ClimateAction {
  pub fn action_type(&self) -> ActionType {
    match self {
      Self::Mitigation(_) => ActionType::Mitigation,
      Self::Adaptation(_) => ActionType::Adaptation,
    }
  }

  pub fn details(&self) -> &ActionDetails {
    match self {
      Self::Mitigation(m) => &m.details,
      Self::Adaptation(a) => &a.details,
    }
  }

  fn details_mut(&mut self) -> &mut ActionDetails {
    match self {
      Self::Mitigation(m) => &mut m.details,
      Self::Adaptation(a) => &mut a.details,
    }
  }

  pub fn action_id(&self) -> &str { &self.details().action_id }

  pub fn action_name(&self) -> &str { &self.details().action_name }

  /// The dense 1-based rank, or `None` if the action was never ranked.
  pub fn priority(&self) -> Option<usize> { self.details().action_priority }

  pub(crate) fn set_priority(&mut self, priority: usize) {
    self.details_mut().action_priority = Some(priority);
  }
}
