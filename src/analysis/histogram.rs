// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Even/odd pair balance of the value histogram, all channels pooled.

use serde::{Deserialize, Serialize};

use super::{TestId, TestOutcome};
use crate::error::{DetectError, Result};
use crate::pixels::PixelGrid;

const DESCRIPTION: &str = "Analyzes pixel value distribution for anomalies";

/// Number of `(2k, 2k+1)` value pairs in an 8-bit histogram.
pub const VALUE_PAIRS: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub threshold: f64,
    /// Deviation of a pair's even fraction from 0.5 that marks the pair.
    pub pair_deviation: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { threshold: 0.20, pair_deviation: 0.30 }
    }
}

impl HistogramConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.pair_deviation) {
            return Err(DetectError::InvalidConfig(format!(
                "histogram.pair_deviation must lie in [0, 0.5), got {}",
                self.pair_deviation
            )));
        }
        Ok(())
    }
}

/// 256-bin histogram summed across channels.
pub fn value_histogram(grid: &PixelGrid) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &b in grid.as_bytes() {
        hist[b as usize] += 1;
    }
    hist
}

/// Pairs whose even fraction deviates from 0.5 by more than `pair_deviation`.
pub fn unbalanced_pairs(hist: &[u64; 256], pair_deviation: f64) -> usize {
    hist.chunks_exact(2)
        .filter(|pair| {
            let total = pair[0] + pair[1];
            total > 0 && (pair[0] as f64 / total as f64 - 0.5).abs() > pair_deviation
        })
        .count()
}

pub(crate) fn run(grid: &PixelGrid, cfg: &HistogramConfig) -> TestOutcome {
    let hist = value_histogram(grid);
    let score = unbalanced_pairs(&hist, cfg.pair_deviation) as f64 / VALUE_PAIRS as f64;
    let suspicious = score > cfg.threshold;
    let interpretation = if suspicious {
        "Unusual patterns in pixel value distribution"
    } else {
        "Normal pixel value distribution"
    };
    TestOutcome::new(TestId::Histogram, score, cfg.threshold, suspicious, DESCRIPTION, interpretation.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_marks_one_pair() {
        let grid = PixelGrid::from_fn(4, 4, |_, _| [128, 128, 128]);
        let hist = value_histogram(&grid);
        assert_eq!(hist[128], 48);
        let o = run(&grid, &HistogramConfig::default());
        assert_eq!(o.score, 1.0 / 128.0);
        assert!(!o.is_suspicious);
    }

    #[test]
    fn every_value_once_is_balanced() {
        let grid = PixelGrid::from_fn(256, 1, |x, _| {
            let v = x as u8;
            [v, v, v]
        });
        let o = run(&grid, &HistogramConfig::default());
        assert_eq!(o.score, 0.0);
        assert_eq!(o.interpretation, "Normal pixel value distribution");
    }

    #[test]
    fn even_only_image_is_suspicious() {
        let grid = PixelGrid::from_fn(128, 2, |x, _| {
            let v = (x * 2) as u8;
            [v, v, v]
        });
        let o = run(&grid, &HistogramConfig::default());
        assert_eq!(o.score, 1.0);
        assert!(o.is_suspicious);
    }

    #[test]
    fn inner_bound_counts_only_large_deviations() {
        let mut hist = [0u64; 256];
        hist[0] = 3;
        hist[1] = 1; // 0.75
        assert_eq!(unbalanced_pairs(&hist, 0.3), 0);
        hist[0] = 9; // 0.9
        assert_eq!(unbalanced_pairs(&hist, 0.3), 1);
        hist[7] = 5; // odd-only pair
        assert_eq!(unbalanced_pairs(&hist, 0.3), 2);
    }
}
