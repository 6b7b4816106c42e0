// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Statistical LSB tests.
//!
//! Six independent estimators, each a pure function of a [`PixelGrid`]:
//!
//! - **Chi-Square**: LSB 0/1 balance across all channel samples.
//! - **Sample Pair**: agreement of LSBs in adjacent pixels.
//! - **RS Analysis**: Fridrich's regular/singular groups under dual flipping masks.
//! - **Entropy**: Shannon entropy of the LSB plane.
//! - **Histogram**: even/odd imbalance of value pairs.
//! - **Python Pattern**: cyclic message repetition and cross-channel copies.
//!
//! The set is closed, so dispatch is a `match` over [`StatisticalTest`]
//! rather than a trait-object list. Tests hold no state between calls and
//! may run concurrently over the same grid.

pub mod chi_square;
pub mod entropy;
pub mod histogram;
pub mod pattern;
pub mod rs;
pub mod sample_pair;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::pixels::PixelGrid;

pub use chi_square::ChiSquareConfig;
pub use entropy::EntropyConfig;
pub use histogram::HistogramConfig;
pub use pattern::{PatternConfig, PatternMode};
pub use rs::RsConfig;
pub use sample_pair::{PairDirections, SampleChannels, SamplePairConfig};

/// Identity of one of the six statistical tests, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestId {
    ChiSquare,
    SamplePair,
    RsAnalysis,
    Entropy,
    Histogram,
    PythonPattern,
}

/// Proven reliability class of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Chi-Square and RS Analysis.
    Premium,
    /// Sample Pair and Python Pattern.
    Moderate,
    /// Entropy and Histogram: known false-positive sources.
    Low,
}

impl TestId {
    pub const ALL: [TestId; 6] = [
        TestId::ChiSquare,
        TestId::SamplePair,
        TestId::RsAnalysis,
        TestId::Entropy,
        TestId::Histogram,
        TestId::PythonPattern,
    ];

    /// Display name used in outcomes and summaries.
    pub const fn name(self) -> &'static str {
        match self {
            TestId::ChiSquare => "Chi-Square Test",
            TestId::SamplePair => "Sample Pair Analysis",
            TestId::RsAnalysis => "RS Analysis (Flipping Mask)",
            TestId::Entropy => "Entropy Analysis",
            TestId::Histogram => "Histogram Analysis",
            TestId::PythonPattern => "Python LSB Pattern",
        }
    }

    pub const fn tier(self) -> Tier {
        match self {
            TestId::ChiSquare | TestId::RsAnalysis => Tier::Premium,
            TestId::SamplePair | TestId::PythonPattern => Tier::Moderate,
            TestId::Entropy | TestId::Histogram => Tier::Low,
        }
    }

    /// Premium and moderate tests count as reliable evidence.
    pub const fn is_reliable(self) -> bool {
        !matches!(self.tier(), Tier::Low)
    }
}

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per statistical test, exhaustive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerTest<T> {
    pub chi_square: T,
    pub sample_pair: T,
    pub rs_analysis: T,
    pub entropy: T,
    pub histogram: T,
    pub python_pattern: T,
}

impl<T> PerTest<T> {
    pub fn get(&self, id: TestId) -> &T {
        match id {
            TestId::ChiSquare => &self.chi_square,
            TestId::SamplePair => &self.sample_pair,
            TestId::RsAnalysis => &self.rs_analysis,
            TestId::Entropy => &self.entropy,
            TestId::Histogram => &self.histogram,
            TestId::PythonPattern => &self.python_pattern,
        }
    }

    /// Iterate `(id, value)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (TestId, &T)> + '_ {
        TestId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Result of running one statistical test. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub test: TestId,
    pub name: &'static str,
    /// Test-specific, non-negative. Only comparable across tests via [`ratio`](Self::ratio).
    pub score: f64,
    pub threshold: f64,
    pub is_suspicious: bool,
    pub description: &'static str,
    pub interpretation: String,
}

impl TestOutcome {
    pub(crate) fn new(
        test: TestId,
        score: f64,
        threshold: f64,
        is_suspicious: bool,
        description: &'static str,
        interpretation: String,
    ) -> Self {
        Self {
            test,
            name: test.name(),
            score: if score > 0.0 { finite_or_zero(score) } else { 0.0 },
            threshold,
            is_suspicious,
            description,
            interpretation,
        }
    }

    /// `score / threshold`, or 0.0 when that is undefined.
    pub fn ratio(&self) -> f64 {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return 0.0;
        }
        finite_or_zero(self.score / self.threshold)
    }
}

/// Map NaN and ±∞ to the neutral value 0.0.
pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// `num / den` with a zero denominator mapped to 0.0.
pub(crate) fn safe_ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// A configured statistical test.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticalTest {
    ChiSquare(ChiSquareConfig),
    SamplePair(SamplePairConfig),
    RsAnalysis(RsConfig),
    Entropy(EntropyConfig),
    Histogram(HistogramConfig),
    PythonPattern(PatternConfig),
}

impl StatisticalTest {
    pub fn id(&self) -> TestId {
        match self {
            Self::ChiSquare(_) => TestId::ChiSquare,
            Self::SamplePair(_) => TestId::SamplePair,
            Self::RsAnalysis(_) => TestId::RsAnalysis,
            Self::Entropy(_) => TestId::Entropy,
            Self::Histogram(_) => TestId::Histogram,
            Self::PythonPattern(_) => TestId::PythonPattern,
        }
    }

    /// Run the test. Pure: reads the grid, keeps no state.
    pub fn execute(&self, grid: &PixelGrid) -> TestOutcome {
        match self {
            Self::ChiSquare(cfg) => chi_square::run(grid, cfg),
            Self::SamplePair(cfg) => sample_pair::run(grid, cfg),
            Self::RsAnalysis(cfg) => rs::run(grid, cfg),
            Self::Entropy(cfg) => entropy::run(grid, cfg),
            Self::Histogram(cfg) => histogram::run(grid, cfg),
            Self::PythonPattern(cfg) => pattern::run(grid, cfg),
        }
    }
}

/// Per-test calibration for the whole suite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub chi_square: ChiSquareConfig,
    pub sample_pair: SamplePairConfig,
    pub rs_analysis: RsConfig,
    pub entropy: EntropyConfig,
    pub histogram: HistogramConfig,
    pub python_pattern: PatternConfig,
}

impl SuiteConfig {
    /// Older calibration: lower thresholds, horizontal-only sample pairs.
    pub fn legacy() -> Self {
        Self {
            chi_square: ChiSquareConfig { threshold: 9.0 },
            sample_pair: SamplePairConfig {
                threshold: 0.25,
                channels: SampleChannels::Red,
                directions: PairDirections::Horizontal,
            },
            rs_analysis: RsConfig { threshold: 0.02, ..RsConfig::default() },
            entropy: EntropyConfig { threshold: 0.997 },
            histogram: HistogramConfig { threshold: 0.10, ..HistogramConfig::default() },
            python_pattern: PatternConfig { threshold: 0.30, ..PatternConfig::default() },
        }
    }

    /// The six configured tests in canonical order.
    pub fn tests(&self) -> [StatisticalTest; 6] {
        [
            StatisticalTest::ChiSquare(self.chi_square.clone()),
            StatisticalTest::SamplePair(self.sample_pair.clone()),
            StatisticalTest::RsAnalysis(self.rs_analysis.clone()),
            StatisticalTest::Entropy(self.entropy.clone()),
            StatisticalTest::Histogram(self.histogram.clone()),
            StatisticalTest::PythonPattern(self.python_pattern.clone()),
        ]
    }

    pub fn threshold(&self, id: TestId) -> f64 {
        match id {
            TestId::ChiSquare => self.chi_square.threshold,
            TestId::SamplePair => self.sample_pair.threshold,
            TestId::RsAnalysis => self.rs_analysis.threshold,
            TestId::Entropy => self.entropy.threshold,
            TestId::Histogram => self.histogram.threshold,
            TestId::PythonPattern => self.python_pattern.threshold,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for id in TestId::ALL {
            let t = self.threshold(id);
            if !(t.is_finite() && t > 0.0) {
                return Err(DetectError::InvalidConfig(format!(
                    "{id} threshold must be finite and positive, got {t}"
                )));
            }
        }
        self.rs_analysis.validate()?;
        self.histogram.validate()?;
        self.python_pattern.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_and_names() {
        let names: Vec<_> = TestId::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names[0], "Chi-Square Test");
        assert_eq!(names[2], "RS Analysis (Flipping Mask)");
        assert_eq!(names[5], "Python LSB Pattern");
        let mut sorted = TestId::ALL;
        sorted.sort();
        assert_eq!(sorted, TestId::ALL);
    }

    #[test]
    fn tiers() {
        assert_eq!(TestId::ChiSquare.tier(), Tier::Premium);
        assert_eq!(TestId::RsAnalysis.tier(), Tier::Premium);
        assert!(TestId::PythonPattern.is_reliable());
        assert!(!TestId::Entropy.is_reliable());
        assert!(!TestId::Histogram.is_reliable());
    }

    #[test]
    fn suite_ids_follow_canonical_order() {
        let ids: Vec<_> = SuiteConfig::default().tests().iter().map(|t| t.id()).collect();
        assert_eq!(ids, TestId::ALL);
    }

    #[test]
    fn ratio_guards_degenerate_thresholds() {
        let mut o = TestOutcome::new(TestId::Entropy, 0.5, 0.0, false, "", String::new());
        assert_eq!(o.ratio(), 0.0);
        o.threshold = f64::NAN;
        assert_eq!(o.ratio(), 0.0);
        o.threshold = 0.25;
        assert_eq!(o.ratio(), 2.0);
    }

    #[test]
    fn outcome_sanitizes_score() {
        let o = TestOutcome::new(TestId::ChiSquare, f64::NAN, 18.0, false, "", String::new());
        assert_eq!(o.score, 0.0);
        let o = TestOutcome::new(TestId::ChiSquare, f64::INFINITY, 18.0, false, "", String::new());
        assert_eq!(o.score, 0.0);
    }

    #[test]
    fn validate_rejects_non_positive_threshold() {
        let mut cfg = SuiteConfig::default();
        cfg.entropy.threshold = 0.0;
        assert!(matches!(cfg.validate(), Err(DetectError::InvalidConfig(_))));
        cfg.entropy.threshold = f64::INFINITY;
        assert!(cfg.validate().is_err());
        assert!(SuiteConfig::default().validate().is_ok());
        assert!(SuiteConfig::legacy().validate().is_ok());
    }

    #[test]
    fn per_test_lookup() {
        let table = PerTest {
            chi_square: 1,
            sample_pair: 2,
            rs_analysis: 3,
            entropy: 4,
            histogram: 5,
            python_pattern: 6,
        };
        let collected: Vec<_> = table.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(*table.get(TestId::Histogram), 5);
    }
}
