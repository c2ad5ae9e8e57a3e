//! Qualitative resilience scoring.
//!
//! A city answers a fixed questionnaire, each answer on a 0 to 4 scale. The
//! answers are summed and normalised by the maximum possible total, giving a
//! score in `[0, 1]` that is classified into a [`ResilienceLevel`].
//!
//! This metric is unrelated to hazard risk. Its bands currently share the
//! numeric cut points of [`crate::hazard::classify_risk`], but they are
//! defined separately so either can change without affecting the other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

/// Highest permitted answer value.
pub const MAX_ANSWER: u8 = 4;

/// Lower bound (inclusive) of [`ResilienceLevel::Medium`].
pub const RESILIENCE_MEDIUM_FROM: f64 = 0.25;
/// Lower bound (inclusive) of [`ResilienceLevel::High`].
pub const RESILIENCE_HIGH_FROM: f64 = 0.5;
/// Lower bound (inclusive) of [`ResilienceLevel::VeryHigh`].
pub const RESILIENCE_VERY_HIGH_FROM: f64 = 0.75;

// ─── Questionnaire ───────────────────────────────────────────────────────────

/// The fixed set of questions that make up the resilience questionnaire.
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
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResilienceQuestion {
  EarlyWarningSystems,
  EmergencyResponsePlanning,
  CriticalInfrastructure,
  HealthServices,
  CommunityPreparedness,
  GovernanceCoordination,
  FinancialReserves,
  NatureBasedProtection,
}

impl ResilienceQuestion {
  /// Largest total a fully answered questionnaire can reach.
  pub fn max_total() -> u32 {
    Self::iter().count() as u32 * u32::from(MAX_ANSWER)
  }
}

/// Answers keyed by question. Unanswered questions are simply absent.
pub type ResilienceAnswers = BTreeMap<ResilienceQuestion, u8>;

// ─── Levels ──────────────────────────────────────────────────────────────────

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
pub enum ResilienceLevel {
  Low,
  Medium,
  High,
  VeryHigh,
}

/// Score plus level for one questionnaire. Both are `None` when any
/// question is unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceAssessment {
  pub score: Option<f64>,
  pub level: Option<ResilienceLevel>,
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Normalised resilience score in `[0, 1]`.
///
/// Returns `Ok(None)` if a question is unanswered and
/// [`Error::AnswerOutOfRange`] if an answer exceeds [`MAX_ANSWER`].
pub fn resilience_score(answers: &ResilienceAnswers) -> Result<Option<f64>> {
  let mut total = 0u32;
  let mut complete = true;
  for question in ResilienceQuestion::iter() {
    match answers.get(&question) {
      Some(&value) if value > MAX_ANSWER => {
        return Err(Error::AnswerOutOfRange {
          question: question.into(),
          value,
        });
      }
      Some(&value) => total += u32::from(value),
      None => complete = false,
    }
  }
  if !complete {
    return Ok(None);
  }
  Ok(Some(
    f64::from(total) / f64::from(ResilienceQuestion::max_total()),
  ))
}

/// Half-open bands; boundary values belong to the higher band.
pub fn classify_resilience(score: f64) -> Option<ResilienceLevel> {
  if score.is_nan() {
    return None;
  }
  let level = if score >= RESILIENCE_VERY_HIGH_FROM {
    ResilienceLevel::VeryHigh
  } else if score >= RESILIENCE_HIGH_FROM {
    ResilienceLevel::High
  } else if score >= RESILIENCE_MEDIUM_FROM {
    ResilienceLevel::Medium
  } else {
    ResilienceLevel::Low
  };
  Some(level)
}

pub fn assess_resilience(
  answers: &ResilienceAnswers,
) -> Result<ResilienceAssessment> {
  let score = resilience_score(answers)?;
  Ok(ResilienceAssessment {
    score,
    level: score.and_then(classify_resilience),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn uniform(value: u8) -> ResilienceAnswers {
    ResilienceQuestion::iter().map(|q| (q, value)).collect()
  }

  #[test]
  fn max_total_covers_every_question() {
    assert_eq!(ResilienceQuestion::max_total(), 32);
  }

  #[test]
  fn uniform_answers_map_to_expected_levels() {
    let cases = [
      (0, 0.0, ResilienceLevel::Low),
      (1, 0.25, ResilienceLevel::Medium),
      (2, 0.5, ResilienceLevel::High),
      (3, 0.75, ResilienceLevel::VeryHigh),
      (4, 1.0, ResilienceLevel::VeryHigh),
    ];
    for (answer, score, level) in cases {
      let assessment = assess_resilience(&uniform(answer)).unwrap();
      assert_eq!(assessment.score, Some(score));
      assert_eq!(assessment.level, Some(level));
    }
  }

  #[test]
  fn boundaries_belong_to_the_higher_band() {
    assert_eq!(classify_resilience(0.25), Some(ResilienceLevel::Medium));
    assert_eq!(classify_resilience(0.5), Some(ResilienceLevel::High));
    assert_eq!(classify_resilience(0.75), Some(ResilienceLevel::VeryHigh));
    assert_eq!(classify_resilience(0.7499), Some(ResilienceLevel::High));
  }

  #[test]
  fn unanswered_question_makes_score_unavailable() {
    let mut answers = uniform(3);
    answers.remove(&ResilienceQuestion::FinancialReserves);
    let assessment = assess_resilience(&answers).unwrap();
    assert_eq!(assessment.score, None);
    assert_eq!(assessment.level, None);
  }

  #[test]
  fn answer_above_four_is_rejected() {
    let mut answers = uniform(2);
    answers.insert(ResilienceQuestion::HealthServices, 5);
    let err = resilience_score(&answers).unwrap_err();
    assert!(matches!(
      err,
      Error::AnswerOutOfRange { question: "health_services", value: 5 }
    ));
  }

  #[test]
  fn answers_deserialise_from_snake_case_keys() {
    let json = r#"{
      "early_warning_systems": 4, "emergency_response_planning": 3,
      "critical_infrastructure": 2, "health_services": 1,
      "community_preparedness": 0, "governance_coordination": 4,
      "financial_reserves": 3, "nature_based_protection": 3
    }"#;
    let answers: ResilienceAnswers = serde_json::from_str(json).unwrap();
    let score = resilience_score(&answers).unwrap().unwrap();
    assert!((score - 20.0 / 32.0).abs() < 1e-12);
    assert_eq!(classify_resilience(score), Some(ResilienceLevel::High));
  }
}
