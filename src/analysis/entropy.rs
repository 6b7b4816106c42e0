// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Shannon entropy of the LSB plane, in bits per sample.
//!
//! Natural images sit a little below 1.0; LSB replacement pushes toward it.
//! Noisy high-ISO photographs reach the bound as well, so this test is a
//! known false-positive source and carries little weight.

use serde::{Deserialize, Serialize};

use super::chi_square::lsb_counts;
use super::{finite_or_zero, TestId, TestOutcome};
use crate::pixels::PixelGrid;

const DESCRIPTION: &str = "Measures randomness in LSB plane";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    pub threshold: f64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self { threshold: 0.995 }
    }
}

/// `H = −Σ p·log2(p)` over the two symbol frequencies.
pub fn binary_entropy(counts: [u64; 2]) -> f64 {
    let total = counts[0] + counts[1];
    if total == 0 {
        return 0.0;
    }
    let h: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum();
    finite_or_zero(h)
}

pub(crate) fn run(grid: &PixelGrid, cfg: &EntropyConfig) -> TestOutcome {
    let score = binary_entropy(lsb_counts(grid));
    let suspicious = score > cfg.threshold;
    let interpretation = if suspicious {
        "LSB plane has unusually high entropy (too random)"
    } else {
        "LSB plane entropy is within normal range"
    };
    TestOutcome::new(TestId::Entropy, score, cfg.threshold, suspicious, DESCRIPTION, interpretation.to_string())
}
