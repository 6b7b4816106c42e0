// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Human-readable verdict text.

use super::{Evidence, Flagged, RiskLevel, RiskPolicy, RuleCondition};

/// Adjective for a deviation ratio, strongest first.
fn severity(ratio: f64) -> Option<&'static str> {
    if ratio > 100.0 {
        Some("EXTREME")
    } else if ratio > 10.0 {
        Some("Very high")
    } else if ratio > 3.0 {
        Some("High")
    } else {
        None
    }
}

fn bullet(f: &Flagged<'_>) -> String {
    let o = f.outcome;
    match severity(o.ratio()) {
        Some(adj) => format!(
            "• {} [{adj} deviation, {:.1}× threshold]: {}",
            o.name,
            o.ratio(),
            o.interpretation
        ),
        None => format!("• {}: {}", o.name, o.interpretation),
    }
}

fn recommendation(level: RiskLevel) -> Option<[&'static str; 2]> {
    match level {
        RiskLevel::VeryHigh => Some([
            "⚠️ VERY HIGH RISK: Strong evidence of steganography detected.",
            "Recommend immediate investigation and content analysis.",
        ]),
        RiskLevel::High => Some([
            "⚠️ HIGH RISK: Multiple indicators suggest hidden data.",
            "Manual review recommended.",
        ]),
        RiskLevel::Medium => Some([
            "⚠️ MEDIUM RISK: Some statistical irregularities detected.",
            "Consider additional analysis or monitoring.",
        ]),
        RiskLevel::Low => None,
    }
}

pub(super) fn compose(
    evidence: &Evidence<'_>,
    level: RiskLevel,
    matched: Option<&RuleCondition>,
    file_size_bytes: u64,
    policy: &RiskPolicy,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    let n = evidence.flagged.len();
    if n == 0 {
        lines.push("No statistical anomalies detected.".into());
        lines.push("Image appears to contain no hidden data.".into());
    } else {
        let suffix = if n == 1 { "y" } else { "ies" };
        lines.push(format!("Detected {n} statistical anomal{suffix}:"));
        lines.extend(evidence.flagged.iter().map(bullet));
        if let Some([headline, advice]) = recommendation(level) {
            lines.push(String::new());
            lines.push(headline.into());
            lines.push(advice.into());
        }
    }

    if matches!(matched, Some(RuleCondition::ConstantLsbPlane { .. })) {
        lines.push(String::new());
        lines.push("Note: The LSB plane is constant, so it cannot carry hidden data.".into());
    }

    if file_size_bytes < policy.small_file_bytes {
        let mb = file_size_bytes as f64 / (1024.0 * 1024.0);
        lines.push(String::new());
        lines.push(format!("Note: Small file size ({mb:.1}MB) may affect test accuracy."));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::super::assess;
    use super::*;
    use crate::analysis::{TestId, TestOutcome};
    use crate::result::OutcomeSet;

    fn set(flags: &[(TestId, f64, f64, bool)]) -> OutcomeSet {
        TestId::ALL
            .iter()
            .map(|&id| {
                let (score, threshold, suspicious) = flags
                    .iter()
                    .find(|f| f.0 == id)
                    .map_or((0.0, 1.0, false), |f| (f.1, f.2, f.3));
                TestOutcome::new(id, score, threshold, suspicious, "", format!("{} says so", id.name()))
            })
            .collect()
    }

    #[test]
    fn severity_bands() {
        assert_eq!(severity(150.0), Some("EXTREME"));
        assert_eq!(severity(100.0), Some("Very high"));
        assert_eq!(severity(10.5), Some("Very high"));
        assert_eq!(severity(4.0), Some("High"));
        assert_eq!(severity(3.0), None);
    }

    #[test]
    fn bullets_follow_effective_weight() {
        // chi-square 4.0 × 2.5, RS 4.0, python pattern 1.5
        let outcomes = set(&[
            (TestId::ChiSquare, 2047.546875, 18.0, true),
            (TestId::RsAnalysis, 0.115, 0.12, true),
            (TestId::PythonPattern, 0.984, 0.6, true),
            (TestId::Entropy, 0.5, 0.995, false),
        ]);
        let a = assess(&outcomes, 4 * 1024 * 1024, &RiskPolicy::enhanced());
        let lines: Vec<&str> = a.summary.lines().collect();
        assert_eq!(lines[0], "Detected 3 statistical anomalies:");
        assert_eq!(
            lines[1],
            "• Chi-Square Test [EXTREME deviation, 113.8× threshold]: Chi-Square Test says so"
        );
        assert_eq!(lines[2], "• RS Analysis (Flipping Mask): RS Analysis (Flipping Mask) says so");
        assert_eq!(lines[3], "• Python LSB Pattern: Python LSB Pattern says so");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "⚠️ VERY HIGH RISK: Strong evidence of steganography detected.");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn equal_weights_keep_canonical_order() {
        let outcomes = set(&[
            (TestId::PythonPattern, 0.7, 0.6, true),
            (TestId::SamplePair, 0.25, 0.2, true),
        ]);
        let a = assess(&outcomes, 4 * 1024 * 1024, &RiskPolicy::enhanced());
        let lines: Vec<&str> = a.summary.lines().collect();
        assert!(lines[1].starts_with("• Sample Pair Analysis"));
        assert!(lines[2].starts_with("• Python LSB Pattern"));
    }

    #[test]
    fn single_anomaly_is_singular() {
        let outcomes = set(&[(TestId::Histogram, 0.25, 0.2, true)]);
        let a = assess(&outcomes, 4 * 1024 * 1024, &RiskPolicy::enhanced());
        assert!(a.summary.starts_with("Detected 1 statistical anomaly:\n"));
    }

    #[test]
    fn small_file_caveat() {
        let outcomes = set(&[]);
        let a = assess(&outcomes, 200 * 1024, &RiskPolicy::enhanced());
        assert!(a.summary.ends_with("\n\nNote: Small file size (0.2MB) may affect test accuracy."), "{}", a.summary);
        let a = assess(&outcomes, 512 * 1024, &RiskPolicy::enhanced());
        assert!(!a.summary.contains("Small file size"));
    }
}
