// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Weights, magnitude bonuses and the decision table.
//!
//! A [`RiskPolicy`] is plain data, built once and passed by reference into
//! [`assess`](super::assess). Two calibrations ship: [`RiskPolicy::enhanced`]
//! (the default) and the lower-sensitivity [`RiskPolicy::legacy`].

use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::analysis::{PerTest, TestId};
use crate::error::{DetectError, Result};

/// Files smaller than this get the small-sample caveat (0.5 MiB).
pub const SMALL_FILE_BYTES: u64 = 512 * 1024;

/// Bonus multiplier applied to a suspicious test whose
/// `score / threshold` exceeds `above`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusStep {
    pub above: f64,
    pub multiplier: f64,
}

const fn step(above: f64, multiplier: f64) -> BonusStep {
    BonusStep { above, multiplier }
}

/// Predicate of one decision-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Entropy outcome at or below `max_entropy`: the LSB plane is constant.
    ConstantLsbPlane { max_entropy: f64 },
    /// Chi-Square flagged beyond `chi_square_ratio` × threshold, or RS
    /// flagged beyond `rs_ratio` × threshold.
    ExtremeDeviation { chi_square_ratio: f64, rs_ratio: f64 },
    /// Both premium tests flagged and confidence above `min_confidence`.
    BothPremium { min_confidence: f64 },
    /// Either premium test flagged and confidence above `min_confidence`.
    AnyPremium { min_confidence: f64 },
    /// At least `min_tests` flagged (one of them reliable, if required) and
    /// confidence above `min_confidence`.
    FlaggedCount {
        min_tests: usize,
        min_confidence: f64,
        #[serde(default)]
        require_reliable: bool,
    },
}

impl RuleCondition {
    /// Numeric bars the predicate compares against.
    fn bars(&self) -> Vec<f64> {
        match *self {
            RuleCondition::ConstantLsbPlane { max_entropy } => vec![max_entropy],
            RuleCondition::ExtremeDeviation { chi_square_ratio, rs_ratio } => vec![chi_square_ratio, rs_ratio],
            RuleCondition::BothPremium { min_confidence }
            | RuleCondition::AnyPremium { min_confidence }
            | RuleCondition::FlaggedCount { min_confidence, .. } => vec![min_confidence],
        }
    }
}

/// One row of the decision table. Rows are tried top-down; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRule {
    pub when: RuleCondition,
    pub level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_ceiling: Option<f64>,
}

impl DecisionRule {
    const fn new(when: RuleCondition, level: RiskLevel) -> Self {
        Self { when, level, confidence_floor: None, confidence_ceiling: None }
    }
}

/// Complete risk calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub name: String,
    pub weights: PerTest<f64>,
    /// Per-test bonus steps, highest `above` first.
    pub bonuses: PerTest<Vec<BonusStep>>,
    /// Share of its weight a clean test contributes at `ratio = 1`.
    pub near_miss_fraction: f64,
    pub confidence_cap: f64,
    pub rules: Vec<DecisionRule>,
    pub small_file_bytes: u64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self::enhanced()
    }
}

impl RiskPolicy {
    /// Canonical calibration with magnitude bonuses.
    pub fn enhanced() -> Self {
        use RiskLevel::*;
        use RuleCondition::*;

        let other = vec![step(5.0, 1.8), step(2.0, 1.4)];
        Self {
            name: "enhanced".into(),
            weights: PerTest {
                chi_square: 4.0,
                sample_pair: 1.5,
                rs_analysis: 4.0,
                entropy: 0.5,
                histogram: 0.3,
                python_pattern: 1.5,
            },
            bonuses: PerTest {
                chi_square: vec![step(1000.0, 3.0), step(100.0, 2.5), step(10.0, 2.0), step(3.0, 1.5)],
                sample_pair: other.clone(),
                rs_analysis: vec![step(10.0, 2.5), step(5.0, 2.0), step(2.0, 1.5)],
                entropy: other.clone(),
                histogram: other.clone(),
                python_pattern: other,
            },
            near_miss_fraction: 0.25,
            confidence_cap: 98.0,
            rules: vec![
                DecisionRule {
                    confidence_ceiling: Some(0.0),
                    ..DecisionRule::new(ConstantLsbPlane { max_entropy: 0.001 }, Low)
                },
                DecisionRule {
                    confidence_floor: Some(85.0),
                    ..DecisionRule::new(
                        ExtremeDeviation { chi_square_ratio: 100.0, rs_ratio: 5.0 },
                        VeryHigh,
                    )
                },
                DecisionRule::new(BothPremium { min_confidence: 80.0 }, VeryHigh),
                DecisionRule::new(BothPremium { min_confidence: 65.0 }, High),
                DecisionRule::new(AnyPremium { min_confidence: 70.0 }, High),
                DecisionRule::new(
                    FlaggedCount { min_tests: 3, min_confidence: 65.0, require_reliable: true },
                    High,
                ),
                DecisionRule::new(
                    FlaggedCount { min_tests: 3, min_confidence: 50.0, require_reliable: false },
                    Medium,
                ),
                DecisionRule::new(
                    FlaggedCount { min_tests: 2, min_confidence: 45.0, require_reliable: false },
                    Medium,
                ),
            ],
            small_file_bytes: SMALL_FILE_BYTES,
        }
    }

    /// Older, simpler calibration: flat weights, no bonuses, no override rows.
    pub fn legacy() -> Self {
        use RiskLevel::*;
        use RuleCondition::*;

        Self {
            name: "legacy".into(),
            weights: PerTest {
                chi_square: 3.0,
                sample_pair: 1.0,
                rs_analysis: 3.0,
                entropy: 0.5,
                histogram: 0.5,
                python_pattern: 1.0,
            },
            bonuses: PerTest {
                chi_square: Vec::new(),
                sample_pair: Vec::new(),
                rs_analysis: Vec::new(),
                entropy: Vec::new(),
                histogram: Vec::new(),
                python_pattern: Vec::new(),
            },
            near_miss_fraction: 0.3,
            confidence_cap: 95.0,
            rules: vec![
                DecisionRule::new(BothPremium { min_confidence: 80.0 }, VeryHigh),
                DecisionRule::new(BothPremium { min_confidence: 65.0 }, High),
                DecisionRule::new(AnyPremium { min_confidence: 70.0 }, High),
                DecisionRule::new(
                    FlaggedCount { min_tests: 3, min_confidence: 65.0, require_reliable: false },
                    High,
                ),
                DecisionRule::new(
                    FlaggedCount { min_tests: 2, min_confidence: 55.0, require_reliable: false },
                    Medium,
                ),
                DecisionRule::new(
                    FlaggedCount { min_tests: 1, min_confidence: 45.0, require_reliable: false },
                    Medium,
                ),
            ],
            small_file_bytes: SMALL_FILE_BYTES,
        }
    }

    /// Bonus multiplier for a suspicious outcome at `ratio`; 1.0 when no step applies.
    pub fn bonus(&self, test: TestId, ratio: f64) -> f64 {
        self.bonuses
            .get(test)
            .iter()
            .find(|s| ratio > s.above)
            .map_or(1.0, |s| s.multiplier)
    }

    pub fn validate(&self) -> Result<()> {
        let mut total = 0.0;
        for (id, &w) in self.weights.iter() {
            if !(w.is_finite() && w >= 0.0) {
                return Err(invalid(format!("weight for {id} must be finite and non-negative, got {w}")));
            }
            total += w;
        }
        if total <= 0.0 {
            return Err(invalid("weights must not all be zero".into()));
        }
        if !(self.confidence_cap > 0.0 && self.confidence_cap <= 100.0) {
            return Err(invalid(format!("confidence_cap must lie in (0, 100], got {}", self.confidence_cap)));
        }
        if !(0.0..=1.0).contains(&self.near_miss_fraction) {
            return Err(invalid(format!(
                "near_miss_fraction must lie in [0, 1], got {}",
                self.near_miss_fraction
            )));
        }
        for (id, steps) in self.bonuses.iter() {
            if steps.iter().any(|s| !s.above.is_finite()) {
                return Err(invalid(format!("bonus step ratios for {id} must be finite")));
            }
            if steps.iter().any(|s| !(s.multiplier.is_finite() && s.multiplier >= 1.0)) {
                return Err(invalid(format!("bonus multipliers for {id} must be at least 1")));
            }
            if steps.windows(2).any(|p| p[0].above < p[1].above) {
                return Err(invalid(format!("bonus steps for {id} must be ordered by descending ratio")));
            }
        }
        for rule in &self.rules {
            if rule.when.bars().iter().any(|b| !b.is_finite()) {
                return Err(invalid(format!("decision rule {:?} has a non-finite bar", rule.when)));
            }
            let bounds = [rule.confidence_floor, rule.confidence_ceiling];
            if bounds.iter().flatten().any(|b| !(0.0..=100.0).contains(b)) {
                return Err(invalid("confidence floors and ceilings must lie in [0, 100]".into()));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> DetectError {
    DetectError::InvalidConfig(msg)
}
