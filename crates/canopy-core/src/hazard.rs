//! Hazard risk scoring.
//!
//! A [`HazardIndicatorRow`] carries the raw indicators for one hazard in one
//! city, year and sector. Scoring derives vulnerability, risk and a
//! [`RiskLevel`] from those indicators. Derived values are never stored on
//! the row itself; they live on the [`ScoredRow`] wrapper and are always
//! recomputed from the inputs.
//!
//! Missing indicators do not raise errors. They propagate as absent derived
//! values so one malformed record cannot stop the rest of a table from
//! rendering.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One hazard assessment as delivered by the upstream indicator feed.
///
/// Scores are conventionally in `[0, 1]` but are not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardIndicatorRow {
  pub city:                 String,
  pub year:                 String,
  pub sector:               String,
  pub hazard:               String,
  pub climate_threat_score: Option<f64>,
  pub exposure_score:       Option<f64>,
  pub sensitivity_score:    Option<f64>,
  pub adaptive_capacity:    Option<f64>,
}

/// A [`HazardIndicatorRow`] augmented with its derived scores.
///
/// `None` means "not available": at least one input was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRow {
  #[serde(flatten)]
  pub row:                 HazardIndicatorRow,
  pub vulnerability_score: Option<f64>,
  pub risk_score:          Option<f64>,
  pub risk_level:          Option<RiskLevel>,
}

impl ScoredRow {
  /// Whether every derived field could be computed.
  pub fn is_complete(&self) -> bool {
    self.vulnerability_score.is_some()
      && self.risk_score.is_some()
      && self.risk_level.is_some()
  }
}

// ─── Levels ──────────────────────────────────────────────────────────────────

/// Qualitative band for a hazard risk score.
///
/// Variants are declared in increasing severity so `Ord` follows severity.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
  VeryHigh,
}

/// Lower bound (inclusive) of [`RiskLevel::Medium`].
pub const RISK_MEDIUM_FROM: f64 = 0.25;
/// Lower bound (inclusive) of [`RiskLevel::High`].
pub const RISK_HIGH_FROM: f64 = 0.5;
/// Lower bound (inclusive) of [`RiskLevel::VeryHigh`].
pub const RISK_VERY_HIGH_FROM: f64 = 0.75;

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// `sensitivity * (1 - adaptive_capacity)`.
///
/// Total over all reals. An `adaptive_capacity` above 1 yields a negative
/// vulnerability; it is deliberately not clamped.
pub fn compute_vulnerability(sensitivity: f64, adaptive_capacity: f64) -> f64 {
  sensitivity * (1.0 - adaptive_capacity)
}

/// `exposure * vulnerability`.
pub fn compute_risk(exposure: f64, vulnerability: f64) -> f64 {
  exposure * vulnerability
}

/// Map a risk score onto its band. Bands are half-open, so a boundary value
/// belongs to the higher band. Negative scores fall into `Low`; `NaN` has no
/// band.
pub fn classify_risk(risk_score: f64) -> Option<RiskLevel> {
  if risk_score.is_nan() {
    return None;
  }
  let level = if risk_score >= RISK_VERY_HIGH_FROM {
    RiskLevel::VeryHigh
  } else if risk_score >= RISK_HIGH_FROM {
    RiskLevel::High
  } else if risk_score >= RISK_MEDIUM_FROM {
    RiskLevel::Medium
  } else {
    RiskLevel::Low
  };
  Some(level)
}

/// Score a single row. The input is left untouched.
pub fn score_hazard_row(row: &HazardIndicatorRow) -> ScoredRow {
  let vulnerability_score = row
    .sensitivity_score
    .zip(row.adaptive_capacity)
    .map(|(s, ac)| compute_vulnerability(s, ac));
  let risk_score = row
    .exposure_score
    .zip(vulnerability_score)
    .map(|(e, v)| compute_risk(e, v));
  let risk_level = risk_score.and_then(classify_risk);

  ScoredRow {
    row: row.clone(),
    vulnerability_score,
    risk_score,
    risk_level,
  }
}

/// Score every row, preserving order.
pub fn score_hazard_rows(rows: &[HazardIndicatorRow]) -> Vec<ScoredRow> {
  rows.iter().map(score_hazard_row).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(
    exposure: Option<f64>,
    sensitivity: Option<f64>,
    adaptive: Option<f64>,
  ) -> HazardIndicatorRow {
    HazardIndicatorRow {
      city:                 "Porto Alegre".into(),
      year:                 "2030".into(),
      sector:               "Urban infrastructure".into(),
      hazard:               "flood".into(),
      climate_threat_score: Some(0.8),
      exposure_score:       exposure,
      sensitivity_score:    sensitivity,
      adaptive_capacity:    adaptive,
    }
  }

  fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn worked_example_scores_medium() {
    let scored = score_hazard_row(&row(Some(0.6), Some(0.7), Some(0.3)));
    assert!(approx(scored.vulnerability_score.unwrap(), 0.49));
    assert!(approx(scored.risk_score.unwrap(), 0.294));
    assert_eq!(scored.risk_level, Some(RiskLevel::Medium));
    assert!(scored.is_complete());
  }

  #[test]
  fn vulnerability_stays_in_unit_interval_for_normalised_inputs() {
    let steps: Vec<f64> = (0..=10).map(|i| f64::from(i) / 10.0).collect();
    for &s in &steps {
      for &ac in &steps {
        let v = compute_vulnerability(s, ac);
        assert!((0.0..=1.0).contains(&v), "s={s} ac={ac} gave {v}");
      }
    }
  }

  #[test]
  fn adaptive_capacity_above_one_is_not_clamped() {
    let v = compute_vulnerability(0.5, 1.2);
    assert!(v < 0.0);
    assert!(approx(v, -0.1));
    assert_eq!(classify_risk(compute_risk(1.0, v)), Some(RiskLevel::Low));
  }

  #[test]
  fn boundaries_belong_to_the_higher_band() {
    assert_eq!(classify_risk(0.0), Some(RiskLevel::Low));
    assert_eq!(classify_risk(0.249_999), Some(RiskLevel::Low));
    assert_eq!(classify_risk(0.25), Some(RiskLevel::Medium));
    assert_eq!(classify_risk(0.5), Some(RiskLevel::High));
    assert_eq!(classify_risk(0.75), Some(RiskLevel::VeryHigh));
    assert_eq!(classify_risk(3.0), Some(RiskLevel::VeryHigh));
  }

  #[test]
  fn classification_is_monotonic() {
    let mut previous = RiskLevel::Low;
    for i in 0..=200 {
      let level = classify_risk(f64::from(i) / 100.0).unwrap();
      assert!(level >= previous);
      previous = level;
    }
  }

  #[test]
  fn nan_has_no_level() {
    assert_eq!(classify_risk(f64::NAN), None);
  }

  #[test]
  fn missing_inputs_propagate_as_unavailable() {
    let no_sensitivity = score_hazard_row(&row(Some(0.6), None, Some(0.3)));
    assert_eq!(no_sensitivity.vulnerability_score, None);
    assert_eq!(no_sensitivity.risk_score, None);
    assert_eq!(no_sensitivity.risk_level, None);

    let no_exposure = score_hazard_row(&row(None, Some(0.7), Some(0.3)));
    assert!(no_exposure.vulnerability_score.is_some());
    assert_eq!(no_exposure.risk_score, None);
    assert!(!no_exposure.is_complete());
  }

  #[test]
  fn scoring_is_pure() {
    let input = row(Some(0.9), Some(0.4), Some(0.1));
    let before = input.clone();
    let first = score_hazard_row(&input);
    let second = score_hazard_row(&input);
    assert_eq!(first, second);
    assert_eq!(input, before);
  }

  #[test]
  fn rows_deserialise_with_null_and_missing_scores() {
    let json = r#"[
      {"city":"Rio de Janeiro","year":"2025","sector":"Health","hazard":"heatwave",
       "climateThreatScore":0.9,"exposureScore":0.8,"sensitivityScore":null,
       "adaptiveCapacity":0.2},
      {"city":"Rio de Janeiro","year":"2025","sector":"Health","hazard":"drought"}
    ]"#;
    let rows: Vec<HazardIndicatorRow> = serde_json::from_str(json).unwrap();
    let scored = score_hazard_rows(&rows);
    assert_eq!(scored.len(), 2);
    assert!(scored.iter().all(|r| r.risk_level.is_none()));

    let out = serde_json::to_value(&scored[0]).unwrap();
    assert_eq!(out["hazard"], "heatwave");
    assert!(out["riskScore"].is_null());
  }

  #[test]
  fn level_display_and_serde_forms() {
    assert_eq!(RiskLevel::VeryHigh.to_string(), "Very High");
    assert_eq!(
      serde_json::to_string(&RiskLevel::VeryHigh).unwrap(),
      "\"very_high\""
    );
  }
}
