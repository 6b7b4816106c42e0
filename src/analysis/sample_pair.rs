// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Sample pair analysis: LSB agreement of adjacent pixels.
//!
//! Score is `|same / pairs − 0.5|`. Which channels and which neighbour
//! directions contribute is configurable; the default reads the red channel
//! in both directions.

use serde::{Deserialize, Serialize};

use super::{safe_ratio, TestId, TestOutcome};
use crate::pixels::{Channel, PixelGrid};

const DESCRIPTION: &str = "Analyzes correlation between adjacent pixel LSBs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleChannels {
    Red,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairDirections {
    Horizontal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplePairConfig {
    pub threshold: f64,
    pub channels: SampleChannels,
    pub directions: PairDirections,
}

impl Default for SamplePairConfig {
    fn default() -> Self {
        Self {
            threshold: 0.20,
            channels: SampleChannels::Red,
            directions: PairDirections::Both,
        }
    }
}

/// Equal-LSB pairs and total pairs for one channel.
fn count_pairs(grid: &PixelGrid, channel: Channel, directions: PairDirections) -> (u64, u64) {
    let off = channel.offset();
    let mut same = 0u64;
    let mut total = 0u64;

    for row in grid.rows() {
        let lane = row.iter().skip(off).step_by(3);
        for (a, b) in lane.clone().zip(lane.skip(1)) {
            same += u64::from((a ^ b) & 1 == 0);
            total += 1;
        }
    }

    if directions == PairDirections::Both {
        let rows: Vec<&[u8]> = grid.rows().collect();
        for pair in rows.windows(2) {
            for (a, b) in pair[0].iter().skip(off).step_by(3).zip(pair[1].iter().skip(off).step_by(3)) {
                same += u64::from((a ^ b) & 1 == 0);
                total += 1;
            }
        }
    }

    (same, total)
}

pub(crate) fn run(grid: &PixelGrid, cfg: &SamplePairConfig) -> TestOutcome {
    let channels: &[Channel] = match cfg.channels {
        SampleChannels::Red => &[Channel::Red],
        SampleChannels::All => &Channel::ALL,
    };
    let (same, total) = channels
        .iter()
        .map(|&c| count_pairs(grid, c, cfg.directions))
        .fold((0, 0), |(s, t), (ds, dt)| (s + ds, t + dt));

    if total == 0 {
        return TestOutcome::new(
            TestId::SamplePair,
            0.0,
            cfg.threshold,
            false,
            DESCRIPTION,
            "Insufficient data for sample pair analysis".to_string(),
        );
    }

    let ratio = safe_ratio(same, total);
    let score = (ratio - 0.5).abs();
    let suspicious = score > cfg.threshold;
    let interpretation = if suspicious {
        format!("Unusual correlation in adjacent pixels (ratio: {ratio:.3})")
    } else {
        format!("Normal correlation in adjacent pixels (ratio: {ratio:.3})")
    };
    TestOutcome::new(TestId::SamplePair, score, cfg.threshold, suspicious, DESCRIPTION, interpretation)
}
