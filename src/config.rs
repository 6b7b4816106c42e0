// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Detector configuration.
//!
//! A [`DetectorConfig`] is the suite calibration plus the risk policy. It is
//! an immutable value: build it once (from a [`Profile`] or from JSON), hand
//! it to [`Detector::new`](crate::Detector::new), and share the detector.
//!
//! JSON documents are partial overrides of the enhanced profile; omitted
//! fields keep their defaults:
//!
//! ```
//! use phasm_detect::DetectorConfig;
//!
//! let cfg = DetectorConfig::from_json_str(r#"{ "tests": { "chi_square": { "threshold": 9.0 } } }"#).unwrap();
//! assert_eq!(cfg.tests.chi_square.threshold, 9.0);
//! assert_eq!(cfg.tests.rs_analysis.threshold, 0.12);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::SuiteConfig;
use crate::error::{DetectError, Result};
use crate::risk::RiskPolicy;

/// Shipped calibrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Higher thresholds, magnitude bonuses, override rows.
    #[default]
    Enhanced,
    /// Lower thresholds, flat weights, horizontal-only sample pairs.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub tests: SuiteConfig,
    pub policy: RiskPolicy,
}

impl DetectorConfig {
    pub fn profile(profile: Profile) -> Self {
        match profile {
            Profile::Enhanced => Self { tests: SuiteConfig::default(), policy: RiskPolicy::enhanced() },
            Profile::Legacy => Self { tests: SuiteConfig::legacy(), policy: RiskPolicy::legacy() },
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.tests.validate()?;
        self.policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PairDirections, PatternMode};

    #[test]
    fn empty_document_is_enhanced_profile() {
        let cfg = DetectorConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, DetectorConfig::profile(Profile::Enhanced));
        assert_eq!(cfg, DetectorConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = DetectorConfig::from_json_str(
            r#"{
                "tests": { "python_pattern": { "mode": "per_channel" } },
                "policy": { "confidence_cap": 90.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.tests.python_pattern.mode, PatternMode::PerChannel);
        assert_eq!(cfg.tests.python_pattern.threshold, 0.60);
        assert_eq!(cfg.policy.confidence_cap, 90.0);
        assert_eq!(cfg.policy.weights.chi_square, 4.0);
    }

    #[test]
    fn legacy_profile() {
        let cfg = DetectorConfig::profile(Profile::Legacy);
        assert_eq!(cfg.tests.chi_square.threshold, 9.0);
        assert_eq!(cfg.tests.sample_pair.directions, PairDirections::Horizontal);
        assert_eq!(cfg.policy.name, "legacy");
        cfg.validate().unwrap();
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = DetectorConfig::from_json_str(r#"{ "policy": { "confidence_cap": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, DetectError::InvalidConfig(_)), "{err}");
        let err = DetectorConfig::from_json_str(r#"{ "tests": 3 }"#).unwrap_err();
        assert!(matches!(err, DetectError::Json(_)), "{err}");
    }

    #[test]
    fn json_round_trip_of_legacy() {
        let cfg = DetectorConfig::profile(Profile::Legacy);
        let back = DetectorConfig::from_json_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DetectorConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
