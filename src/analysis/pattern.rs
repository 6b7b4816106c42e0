// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Cyclic-message detector for simple scripted LSB embedders.
//!
//! Many hobby tools write the message bits over and over into the flattened
//! `R,G,B,R,G,B,…` byte stream, or copy the same bit into all three channels
//! of a pixel. Both leave traces that ordinary LSB noise never has:
//!
//! - **Repetition**, per channel: one 8-bit block dominating the plane, many
//!   distinct blocks recurring, and a leading window that keeps reappearing
//!   (within a bit-similarity tolerance) block after block.
//! - **Correlation** across channels: pixels whose channel LSBs agree.
//!
//! The two are blended `0.6 / 0.4` in [`PatternMode::CrossChannel`] (where
//! correlation is three-way agreement) or `0.7 / 0.3` in
//! [`PatternMode::PerChannel`] (best pairwise agreement).

use serde::{Deserialize, Serialize};

use super::{safe_ratio, TestId, TestOutcome};
use crate::error::{DetectError, Result};
use crate::pixels::{Channel, PixelGrid};

const DESCRIPTION: &str = "Detects Python-style LSB embedding patterns in individual channels";

/// Block granularity of the repetition scan, in bits.
const BLOCK_BITS: usize = 8;
/// Repetition above which a channel is named in the interpretation.
const CHANNEL_REPORT_FLOOR: f64 = 0.3;

const REPEATED_BLOCK_BONUS: f64 = 0.1;
const REPEATED_BLOCK_BONUS_CAP: f64 = 0.3;
const SEQUENTIAL_CAP: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternMode {
    CrossChannel,
    PerChannel,
}

impl PatternMode {
    /// `(repetition, correlation)` blend weights.
    const fn weights(self) -> (f64, f64) {
        match self {
            PatternMode::CrossChannel => (0.6, 0.4),
            PatternMode::PerChannel => (0.7, 0.3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub threshold: f64,
    pub mode: PatternMode,
    /// Fraction of equal bits for a block to count as a repeat of the leading window.
    pub similarity: f64,
    pub min_window: usize,
    pub max_window: usize,
    /// Shorter LSB sequences score zero repetition.
    pub min_bits: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            threshold: 0.60,
            mode: PatternMode::CrossChannel,
            similarity: 0.80,
            min_window: 8,
            max_window: 120,
            min_bits: 64,
        }
    }
}

impl PatternConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.similarity > 0.0 && self.similarity <= 1.0) {
            return Err(DetectError::InvalidConfig(format!(
                "python_pattern.similarity must lie in (0, 1], got {}",
                self.similarity
            )));
        }
        let aligned = |w: usize| w >= BLOCK_BITS && w % BLOCK_BITS == 0;
        if !aligned(self.min_window) || !aligned(self.max_window) || self.min_window > self.max_window {
            return Err(DetectError::InvalidConfig(format!(
                "python_pattern windows must be non-zero multiples of 8 with min <= max, got {}..={}",
                self.min_window, self.max_window
            )));
        }
        Ok(())
    }
}

/// Pack eight 0/1 values into a byte key.
#[inline]
fn pack(block: &[u8]) -> usize {
    block.iter().fold(0usize, |acc, &b| (acc << 1) | (b & 1) as usize)
}

fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let equal = a.iter().zip(b).filter(|(x, y)| x == y).count();
    safe_ratio(equal as u64, a.len() as u64)
}

/// Repetition score of one LSB sequence, in `[0, 1]`.
pub fn repetition_score(bits: &[u8], cfg: &PatternConfig) -> f64 {
    let n = bits.len();
    if n < cfg.min_bits.max(BLOCK_BITS) {
        return 0.0;
    }

    let mut counts = [0u32; 256];
    let mut blocks = 0u64;
    for block in bits.chunks_exact(BLOCK_BITS) {
        counts[pack(block)] += 1;
        blocks += 1;
    }
    let most_common = counts.iter().copied().max().unwrap_or(0);
    let base = safe_ratio(u64::from(most_common), blocks);
    let repeated = counts.iter().filter(|&&c| c > 1).count();
    let bonus = (REPEATED_BLOCK_BONUS * repeated as f64).min(REPEATED_BLOCK_BONUS_CAP);

    let mut sequential = 0.0f64;
    let mut w = cfg.min_window.max(BLOCK_BITS);
    while w <= cfg.max_window && w <= n / 3 {
        let lead = &bits[..w];
        let following = (n - w) / w;
        let run = bits[w..]
            .chunks_exact(w)
            .take_while(|block| similarity(lead, block) >= cfg.similarity)
            .count();
        if following > 0 {
            sequential = sequential.max(run as f64 / following as f64);
        }
        w += BLOCK_BITS;
    }

    (base + bonus + sequential.min(SEQUENTIAL_CAP)).min(1.0)
}

/// Fraction of positions where all three planes agree.
fn three_way_agreement(planes: &[Vec<u8>; 3]) -> f64 {
    let equal = planes[0]
        .iter()
        .zip(&planes[1])
        .zip(&planes[2])
        .filter(|((r, g), b)| r == g && g == b)
        .count();
    safe_ratio(equal as u64, planes[0].len() as u64)
}

/// Highest agreement between any two planes.
fn best_pairwise_agreement(planes: &[Vec<u8>; 3]) -> f64 {
    [(0, 1), (0, 2), (1, 2)]
        .iter()
        .map(|&(a, b)| similarity(&planes[a], &planes[b]))
        .fold(0.0, f64::max)
}

/// Sub-signals behind one pattern outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSignals {
    /// Repetition score per channel, `[R, G, B]`.
    pub repetition: [f64; 3],
    pub correlation: f64,
}

impl PatternSignals {
    pub fn measure(grid: &PixelGrid, cfg: &PatternConfig) -> Self {
        let planes = Channel::ALL.map(|c| grid.lsb_plane(c));
        let repetition = [
            repetition_score(&planes[0], cfg),
            repetition_score(&planes[1], cfg),
            repetition_score(&planes[2], cfg),
        ];
        let correlation = match cfg.mode {
            PatternMode::CrossChannel => three_way_agreement(&planes),
            PatternMode::PerChannel => best_pairwise_agreement(&planes),
        };
        Self { repetition, correlation }
    }

    pub fn max_repetition(&self) -> f64 {
        self.repetition.iter().copied().fold(0.0, f64::max)
    }

    pub fn score(&self, mode: PatternMode) -> f64 {
        let (wr, wc) = mode.weights();
        wr * self.max_repetition() + wc * self.correlation
    }

    /// Channels carrying the strongest repetition, e.g. `"Red Green channel(s)"`.
    fn channel_info(&self) -> String {
        let max = self.max_repetition();
        let names: Vec<&str> = Channel::ALL
            .iter()
            .zip(self.repetition)
            .filter(|&(_, r)| r == max && r > CHANNEL_REPORT_FLOOR)
            .map(|(c, _)| c.name())
            .collect();
        if names.is_empty() {
            "None".to_string()
        } else {
            format!("{} channel(s)", names.join(" "))
        }
    }
}

pub(crate) fn run(grid: &PixelGrid, cfg: &PatternConfig) -> TestOutcome {
    let signals = PatternSignals::measure(grid, cfg);
    let score = signals.score(cfg.mode);
    let suspicious = score > cfg.threshold;
    let rep = signals.max_repetition();
    let corr = signals.correlation;
    let interpretation = if suspicious {
        format!(
            "Python LSB pattern detected in {} (repetition: {rep:.3}, correlation: {corr:.3})",
            signals.channel_info()
        )
    } else {
        format!("No Python LSB pattern detected (repetition: {rep:.3}, correlation: {corr:.3})")
    };
    TestOutcome::new(TestId::PythonPattern, score, cfg.threshold, suspicious, DESCRIPTION, interpretation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn bits_of(msg: &[u8]) -> Vec<u8> {
        msg.iter().flat_map(|&b| (0..8).map(move |i| (b >> i) & 1)).collect()
    }

    fn mirrored(w: u32, h: u32, msg: &[u8]) -> PixelGrid {
        let bits = bits_of(msg);
        PixelGrid::from_fn(w, h, |x, y| {
            let b = bits[(y * w + x) as usize % bits.len()];
            let v = 128 | b;
            [v, v, v]
        })
    }

    #[test]
    fn short_sequence_scores_zero() {
        let cfg = PatternConfig::default();
        assert_eq!(repetition_score(&[1; 63], &cfg), 0.0);
        assert_eq!(repetition_score(&[], &cfg), 0.0);
    }

    #[test]
    fn constant_sequence_saturates() {
        assert_eq!(repetition_score(&[0; 256], &PatternConfig::default()), 1.0);
    }

    #[test]
    fn mirrored_message_is_suspicious() {
        let grid = mirrored(64, 64, b"HIDDEN DATA");
        let cfg = PatternConfig::default();
        let signals = PatternSignals::measure(&grid, &cfg);
        assert!(signals.correlation >= 0.99);
        assert!(signals.max_repetition() > 0.9);

        let o = run(&grid, &cfg);
        assert!(o.is_suspicious, "{}", o.interpretation);
        assert!(
            o.interpretation.starts_with("Python LSB pattern detected in Red Green Blue channel(s)"),
            "{}",
            o.interpretation
        );
    }

    #[test]
    fn random_planes_stay_below_threshold() {
        let mut rng = ChaCha20Rng::from_seed([42u8; 32]);
        let grid = PixelGrid::from_fn(64, 64, |_, _| rng.gen());
        for mode in [PatternMode::CrossChannel, PatternMode::PerChannel] {
            let cfg = PatternConfig { mode, ..Default::default() };
            let o = run(&grid, &cfg);
            assert!(!o.is_suspicious, "{mode:?}: {}", o.interpretation);
            assert!(o.interpretation.starts_with("No Python LSB pattern detected"));
        }
    }

    #[test]
    fn per_channel_mode_uses_pairwise_agreement() {
        // red and green identical, blue inverted
        let grid = PixelGrid::from_fn(16, 16, |x, y| {
            let b = ((x * 3 + y * 5) % 7 % 2) as u8;
            [b, b, b ^ 1]
        });
        let cross = PatternSignals::measure(&grid, &PatternConfig::default());
        let per = PatternSignals::measure(
            &grid,
            &PatternConfig { mode: PatternMode::PerChannel, ..Default::default() },
        );
        assert_eq!(cross.correlation, 0.0);
        assert_eq!(per.correlation, 1.0);
    }

    #[test]
    fn window_validation() {
        assert!(PatternConfig::default().validate().is_ok());
        let bad = PatternConfig { min_window: 12, ..Default::default() };
        assert!(bad.validate().is_err());
        let inverted = PatternConfig { min_window: 128, max_window: 64, ..Default::default() };
        assert!(inverted.validate().is_err());
        let zero_sim = PatternConfig { similarity: 0.0, ..Default::default() };
        assert!(zero_sim.validate().is_err());
    }
}
