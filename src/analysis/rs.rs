// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RS (Regular/Singular) analysis with dual flipping masks.
//!
//! The red channel is cut into non-overlapping groups of four bytes. Each
//! group is flipped under the positive mask `[0,1,1,0]` and, independently,
//! the negative mask `[1,0,0,1]`; a group is *regular* when flipping raises
//! its variation, *singular* when it lowers it. In a clean image the two
//! masks produce nearly the same R/S ratios. LSB replacement pulls them
//! apart.
//!
//! Two signals come out: the discrimination `max(|R_M − R_−M|, |S_M − S_−M|)`
//! (the reported score) and an estimated payload fraction. Either one
//! crossing its bound marks the outcome suspicious.
//!
//! Reference: J. Fridrich, M. Goljan, R. Du, "Reliable Detection of LSB
//! Steganography in Color and Grayscale Images", ACM MM&Sec 2001.

use serde::{Deserialize, Serialize};

use super::{finite_or_zero, safe_ratio, TestId, TestOutcome};
use crate::error::{DetectError, Result};
use crate::pixels::{Channel, PixelGrid};

const DESCRIPTION: &str = "Classical RS analysis using dual flipping masks";

pub const POSITIVE_MASK: [bool; 4] = [false, true, true, false];
pub const NEGATIVE_MASK: [bool; 4] = [true, false, false, true];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsConfig {
    /// Bound on the discrimination score.
    pub threshold: f64,
    /// Estimated payload fraction above which the outcome is suspicious.
    pub payload_floor: f64,
    /// Multiplier from R/S asymmetry to payload fraction.
    pub payload_scale: f64,
}

impl Default for RsConfig {
    fn default() -> Self {
        Self { threshold: 0.12, payload_floor: 0.03, payload_scale: 2.0 }
    }
}

impl RsConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.payload_floor) {
            return Err(DetectError::InvalidConfig(format!(
                "rs_analysis.payload_floor must lie in [0, 1], got {}",
                self.payload_floor
            )));
        }
        if !(self.payload_scale.is_finite() && self.payload_scale > 0.0) {
            return Err(DetectError::InvalidConfig(format!(
                "rs_analysis.payload_scale must be finite and positive, got {}",
                self.payload_scale
            )));
        }
        Ok(())
    }
}

/// Group classification counts under one mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsCounts {
    pub regular: u64,
    pub singular: u64,
    pub unusable: u64,
}

impl RsCounts {
    pub fn total(&self) -> u64 {
        self.regular + self.singular + self.unusable
    }

    fn regular_ratio(&self) -> f64 {
        safe_ratio(self.regular, self.total())
    }

    fn singular_ratio(&self) -> f64 {
        safe_ratio(self.singular, self.total())
    }
}

/// Smoothness of a group: sum of absolute differences of neighbours.
#[inline]
fn variation(g: &[u8; 4]) -> u32 {
    g.windows(2).map(|w| w[0].abs_diff(w[1]) as u32).sum()
}

/// Classify every complete group of four under `mask`.
pub fn classify(values: &[u8], mask: [bool; 4]) -> RsCounts {
    let mut counts = RsCounts::default();
    for chunk in values.chunks_exact(4) {
        let group = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let mut flipped = group;
        for (v, &m) in flipped.iter_mut().zip(&mask) {
            if m {
                *v ^= 1;
            }
        }
        let before = variation(&group);
        let after = variation(&flipped);
        match after.cmp(&before) {
            std::cmp::Ordering::Greater => counts.regular += 1,
            std::cmp::Ordering::Less => counts.singular += 1,
            std::cmp::Ordering::Equal => counts.unusable += 1,
        }
    }
    counts
}

/// Both RS signals for one byte sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsEstimate {
    pub discrimination: f64,
    pub payload: f64,
}

pub fn estimate(values: &[u8], payload_scale: f64) -> RsEstimate {
    let pos = classify(values, POSITIVE_MASK);
    let neg = classify(values, NEGATIVE_MASK);

    let (r_m, s_m) = (pos.regular_ratio(), pos.singular_ratio());
    let (r_nm, s_nm) = (neg.regular_ratio(), neg.singular_ratio());

    let discrimination = (r_m - r_nm).abs().max((s_m - s_nm).abs());
    let asymmetry = (r_m - r_nm).max(s_nm - s_m);
    let payload = finite_or_zero(asymmetry * payload_scale).clamp(0.0, 1.0);

    RsEstimate { discrimination: finite_or_zero(discrimination), payload }
}

pub(crate) fn run(grid: &PixelGrid, cfg: &RsConfig) -> TestOutcome {
    if grid.len() < 4 {
        return TestOutcome::new(
            TestId::RsAnalysis,
            0.0,
            cfg.threshold,
            false,
            DESCRIPTION,
            "Insufficient data for RS analysis".to_string(),
        );
    }

    let red: Vec<u8> = grid.channel(Channel::Red).collect();
    let est = estimate(&red, cfg.payload_scale);
    let suspicious = est.discrimination > cfg.threshold || est.payload > cfg.payload_floor;
    let verdict = if suspicious {
        "RS analysis detects steganography"
    } else {
        "RS analysis shows normal patterns"
    };
    let interpretation = format!(
        "{verdict}: estimated {:.1}% payload, discrimination {:.4}",
        est.payload * 100.0,
        est.discrimination
    );
    TestOutcome::new(TestId::RsAnalysis, est.discrimination, cfg.threshold, suspicious, DESCRIPTION, interpretation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_classification() {
        // [10,11,12,13]: positive → [10,10,13,13] (3 → 3), negative → [11,11,12,12] (3 → 1)
        let v = [10u8, 11, 12, 13];
        assert_eq!(classify(&v, POSITIVE_MASK), RsCounts { regular: 0, singular: 0, unusable: 1 });
        assert_eq!(classify(&v, NEGATIVE_MASK), RsCounts { regular: 0, singular: 1, unusable: 0 });
        let est = estimate(&v, 2.0);
        assert_eq!(est.discrimination, 1.0);
        assert_eq!(est.payload, 1.0);
    }

    #[test]
    fn flat_groups_are_symmetric() {
        let v = [100u8; 16];
        let pos = classify(&v, POSITIVE_MASK);
        let neg = classify(&v, NEGATIVE_MASK);
        assert_eq!(pos, RsCounts { regular: 4, singular: 0, unusable: 0 });
        assert_eq!(pos, neg);
        let est = estimate(&v, 2.0);
        assert_eq!(est.discrimination, 0.0);
        assert_eq!(est.payload, 0.0);
    }

    #[test]
    fn trailing_partial_group_is_ignored() {
        let v = [100u8, 100, 100, 100, 7, 9];
        assert_eq!(classify(&v, POSITIVE_MASK).total(), 1);
    }

    #[test]
    fn fewer_than_four_pixels_is_neutral() {
        let grid = PixelGrid::from_raw(3, 1, vec![10, 0, 0, 11, 0, 0, 12, 0, 0]).unwrap();
        let o = run(&grid, &RsConfig::default());
        assert_eq!(o.score, 0.0);
        assert!(!o.is_suspicious);
        assert_eq!(o.interpretation, "Insufficient data for RS analysis");
    }

    #[test]
    fn flat_image_is_clean() {
        let grid = PixelGrid::from_fn(8, 8, |_, _| [128, 128, 128]);
        let o = run(&grid, &RsConfig::default());
        assert!(!o.is_suspicious);
        assert_eq!(
            o.interpretation,
            "RS analysis shows normal patterns: estimated 0.0% payload, discrimination 0.0000"
        );
    }

    #[test]
    fn payload_alone_trips_outcome() {
        // one ramp group among flat ones: discrimination 0.1 stays below 0.12,
        // payload 0.2 clears the floor
        let mut red = vec![100u8; 40];
        red[..4].copy_from_slice(&[10, 11, 12, 13]);
        let grid = PixelGrid::from_fn(10, 4, |x, y| [red[(y * 10 + x) as usize], 0, 0]);
        let o = run(&grid, &RsConfig::default());
        assert!((o.score - 0.1).abs() < 1e-12);
        assert!(o.is_suspicious);
    }

    #[test]
    fn config_validation() {
        assert!(RsConfig::default().validate().is_ok());
        let bad = RsConfig { payload_floor: 1.5, ..Default::default() };
        assert!(bad.validate().is_err());
    }
}
