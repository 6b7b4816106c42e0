// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Detection result value objects.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::analysis::{TestId, TestOutcome};
use crate::error::Result;
use crate::risk::{Assessment, RiskLevel};

/// Outcomes keyed by test identity. Iterates in canonical test order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutcomeSet(BTreeMap<TestId, TestOutcome>);

impl OutcomeSet {
    pub fn get(&self, id: TestId) -> Option<&TestOutcome> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TestId, &TestOutcome)> + '_ {
        self.0.iter().map(|(&id, o)| (id, o))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All six tests present.
    pub fn is_complete(&self) -> bool {
        TestId::ALL.iter().all(|id| self.0.contains_key(id))
    }

    /// Suspicious outcomes in canonical order.
    pub fn flagged(&self) -> impl Iterator<Item = &TestOutcome> + '_ {
        self.0.values().filter(|o| o.is_suspicious)
    }
}

impl FromIterator<TestOutcome> for OutcomeSet {
    fn from_iter<I: IntoIterator<Item = TestOutcome>>(iter: I) -> Self {
        Self(iter.into_iter().map(|o| (o.test, o)).collect())
    }
}

/// Verdict for one image. Built once per detection and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub is_suspicious: bool,
    /// In `[0, confidence_cap]` of the active policy.
    pub overall_confidence: f64,
    pub risk_level: RiskLevel,
    pub outcomes: OutcomeSet,
    pub summary: String,
    pub processing_time_ms: u64,
}

impl DetectionResult {
    pub(crate) fn from_assessment(outcomes: OutcomeSet, assessment: Assessment, elapsed: Duration) -> Self {
        Self {
            is_suspicious: assessment.is_suspicious,
            overall_confidence: assessment.overall_confidence,
            risk_level: assessment.risk_level,
            outcomes,
            summary: assessment.summary,
            processing_time_ms: millis(elapsed),
        }
    }

    /// Terminal result for an image that could not be analyzed.
    pub fn failed(message: impl std::fmt::Display, elapsed: Duration) -> Self {
        Self {
            is_suspicious: false,
            overall_confidence: 0.0,
            risk_level: RiskLevel::Low,
            outcomes: OutcomeSet::default(),
            summary: format!("Error analyzing image: {message}"),
            processing_time_ms: millis(elapsed),
        }
    }

    /// Whether this is a failure result rather than a verdict.
    pub fn is_failure(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
