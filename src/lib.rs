// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # phasm-detect
//!
//! Pure-Rust statistical steganalysis for LSB embedding in raster images.
//! Six independent tests read the pixel grid; a weighted risk assessor turns
//! their outcomes into a confidence and a discrete risk level:
//!
//! - **Chi-Square**, **RS Analysis**: premium tests, heavy weight, magnitude
//!   bonuses for extreme deviations.
//! - **Sample Pair**, **Python Pattern**: moderate weight.
//! - **Entropy**, **Histogram**: light weight; noisy photographs trip them.
//!
//! Only `High` and `VeryHigh` mark an image as suspicious. `Medium` is
//! reported without the flag.
//!
//! The analysis core is std only plus serde for configuration. Image
//! decoding (`decode` feature) uses the `image` crate; concurrent test
//! execution (`parallel` feature) uses rayon.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use phasm_detect::Detector;
//!
//! let result = Detector::default().detect_file("photo.png");
//! println!("{}: {:.1}%", result.risk_level, result.overall_confidence);
//! println!("{}", result.summary);
//! ```

pub mod analysis;
pub mod config;
pub mod detector;
pub mod error;
pub mod fixture;
pub mod pixels;
pub mod result;
pub mod risk;

pub use analysis::{PerTest, StatisticalTest, SuiteConfig, TestId, TestOutcome, Tier};
pub use config::{DetectorConfig, Profile};
pub use detector::{Detector, Execution};
pub use error::{DetectError, Result};
pub use pixels::{Channel, PixelGrid};
pub use result::{DetectionResult, OutcomeSet};
pub use risk::{assess, Assessment, RiskLevel, RiskPolicy};
