// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Risk assessment: weighted confidence, decision table, summary.
//!
//! The pipeline is deterministic and runs single-threaded after every test
//! has finished:
//!
//! 1. Each outcome gets its base weight from the [`RiskPolicy`]. A suspicious
//!    outcome's weight is multiplied by the first bonus step its
//!    `score / threshold` ratio exceeds.
//! 2. Suspicious outcomes contribute their full effective weight; clean ones
//!    contribute `weight × min(1, ratio) × near_miss_fraction`, so a test
//!    close to tripping still nudges the total.
//!    `confidence = 100 × Σ contribution / Σ weight`, capped by the policy.
//! 3. The decision table is tried top-down; the first matching row fixes the
//!    [`RiskLevel`] and may clamp the confidence. No match means `Low`.
//! 4. Only `High` and `VeryHigh` set `is_suspicious`. `Medium` is reported
//!    but not flagged.

pub mod policy;
mod summary;

use serde::{Deserialize, Serialize};

use crate::analysis::{finite_or_zero, TestId, TestOutcome};
use crate::result::OutcomeSet;

pub use policy::{BonusStep, DecisionRule, RiskPolicy, RuleCondition, SMALL_FILE_BYTES};

/// Discrete risk classification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }

    /// Whether this level marks the image as suspicious.
    pub const fn is_flagged(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::VeryHigh)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of [`assess`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub is_suspicious: bool,
    pub overall_confidence: f64,
    pub risk_level: RiskLevel,
    pub summary: String,
    /// Decision-table row that fixed the level, if any.
    pub matched_rule: Option<RuleCondition>,
}

/// A suspicious outcome with its bonused weight.
#[derive(Debug)]
pub(crate) struct Flagged<'a> {
    pub outcome: &'a TestOutcome,
    pub effective_weight: f64,
}

/// Everything the decision table and the summary look at.
#[derive(Debug)]
pub(crate) struct Evidence<'a> {
    outcomes: &'a OutcomeSet,
    /// Uncapped weighted confidence.
    pub confidence: f64,
    /// Suspicious outcomes by descending effective weight, ties in canonical order.
    pub flagged: Vec<Flagged<'a>>,
}

impl<'a> Evidence<'a> {
    pub fn gather(outcomes: &'a OutcomeSet, policy: &RiskPolicy) -> Self {
        let mut contributed = 0.0;
        let mut total = 0.0;
        let mut flagged = Vec::new();

        for (id, outcome) in outcomes.iter() {
            let weight = *policy.weights.get(id);
            let ratio = outcome.ratio();
            if outcome.is_suspicious {
                let effective_weight = weight * policy.bonus(id, ratio);
                contributed += effective_weight;
                total += effective_weight;
                flagged.push(Flagged { outcome, effective_weight });
            } else {
                contributed += weight * ratio.min(1.0) * policy.near_miss_fraction;
                total += weight;
            }
        }

        // stable: equal weights keep canonical order
        flagged.sort_by(|a, b| b.effective_weight.total_cmp(&a.effective_weight));

        let confidence = if total > 0.0 { finite_or_zero(100.0 * contributed / total) } else { 0.0 };
        Self { outcomes, confidence, flagged }
    }

    fn is_flagged(&self, id: TestId) -> bool {
        self.outcomes.get(id).is_some_and(|o| o.is_suspicious)
    }

    fn flagged_ratio(&self, id: TestId) -> f64 {
        match self.outcomes.get(id) {
            Some(o) if o.is_suspicious => o.ratio(),
            _ => 0.0,
        }
    }

    fn matches(&self, condition: &RuleCondition, confidence: f64) -> bool {
        let chi = self.is_flagged(TestId::ChiSquare);
        let rs = self.is_flagged(TestId::RsAnalysis);
        match *condition {
            RuleCondition::ConstantLsbPlane { max_entropy } => self
                .outcomes
                .get(TestId::Entropy)
                .is_some_and(|o| o.score <= max_entropy),
            RuleCondition::ExtremeDeviation { chi_square_ratio, rs_ratio } => {
                self.flagged_ratio(TestId::ChiSquare) > chi_square_ratio
                    || self.flagged_ratio(TestId::RsAnalysis) > rs_ratio
            }
            RuleCondition::BothPremium { min_confidence } => chi && rs && confidence > min_confidence,
            RuleCondition::AnyPremium { min_confidence } => (chi || rs) && confidence > min_confidence,
            RuleCondition::FlaggedCount { min_tests, min_confidence, require_reliable } => {
                self.flagged.len() >= min_tests
                    && (!require_reliable || self.flagged.iter().any(|f| f.outcome.test.is_reliable()))
                    && confidence > min_confidence
            }
        }
    }
}

/// Turn a complete outcome set into a verdict. Pure; never panics.
pub fn assess(outcomes: &OutcomeSet, file_size_bytes: u64, policy: &RiskPolicy) -> Assessment {
    let evidence = Evidence::gather(outcomes, policy);
    let cap = policy.confidence_cap;
    let confidence = evidence.confidence.min(cap);

    let matched = policy.rules.iter().find(|rule| evidence.matches(&rule.when, confidence));
    let (risk_level, confidence) = match matched {
        Some(rule) => {
            let mut c = confidence;
            if let Some(floor) = rule.confidence_floor {
                c = c.max(floor);
            }
            if let Some(ceiling) = rule.confidence_ceiling {
                c = c.min(ceiling);
            }
            (rule.level, c)
        }
        None => (RiskLevel::Low, confidence),
    };
    let overall_confidence = finite_or_zero(confidence).clamp(0.0, cap.clamp(0.0, 100.0));

    let matched_rule = matched.map(|r| r.when.clone());
    let summary = summary::compose(&evidence, risk_level, matched_rule.as_ref(), file_size_bytes, policy);

    Assessment {
        is_suspicious: risk_level.is_flagged(),
        overall_confidence,
        risk_level,
        summary,
        matched_rule,
    }
}
