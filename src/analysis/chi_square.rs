// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Chi-square goodness of fit of the LSB plane against a uniform 0/1 split.
//!
//! Every channel sample contributes one bit. With `n` samples the expected
//! count per bin is `n / 2`; an image whose LSBs all fall into one bin scores
//! `n`.

use serde::{Deserialize, Serialize};

use super::{finite_or_zero, TestId, TestOutcome};
use crate::pixels::PixelGrid;

const DESCRIPTION: &str = "Tests if LSB distribution deviates from expected randomness";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiSquareConfig {
    pub threshold: f64,
}

impl Default for ChiSquareConfig {
    fn default() -> Self {
        Self { threshold: 18.0 }
    }
}

/// χ² of two observed bin counts against equal expectation.
pub fn chi_square_statistic(counts: [u64; 2]) -> f64 {
    let total = counts[0] + counts[1];
    if total == 0 {
        return 0.0;
    }
    let expected = total as f64 / 2.0;
    let chi: f64 = counts
        .iter()
        .map(|&observed| {
            let d = observed as f64 - expected;
            d * d / expected
        })
        .sum();
    finite_or_zero(chi)
}

/// `[zeros, ones]` over the LSB of every channel sample.
pub(crate) fn lsb_counts(grid: &PixelGrid) -> [u64; 2] {
    let ones = grid.as_bytes().iter().filter(|&&b| b & 1 == 1).count() as u64;
    [grid.as_bytes().len() as u64 - ones, ones]
}

pub(crate) fn run(grid: &PixelGrid, cfg: &ChiSquareConfig) -> TestOutcome {
    let score = chi_square_statistic(lsb_counts(grid));
    let suspicious = score > cfg.threshold;
    let interpretation = if suspicious {
        "LSB distribution is significantly non-random, suggesting steganography"
    } else {
        "LSB distribution appears random and natural"
    };
    TestOutcome::new(
        TestId::ChiSquare,
        score,
        cfg.threshold,
        suspicious,
        DESCRIPTION,
        interpretation.to_string(),
    )
}
