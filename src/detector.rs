// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Test orchestration: fan out the six tests, join, assess.
//!
//! With the `parallel` feature the tests run on the rayon pool; each only
//! reads the shared grid, so the result is identical to a sequential run.
//! Assessment starts after every outcome is in.
//!
//! Detection never returns an error. A decode failure or a panicking test
//! becomes a neutral [`DetectionResult`] whose summary carries the message,
//! so a batch caller can move on to the next file.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, error, info, info_span};

use crate::analysis::{StatisticalTest, TestId, TestOutcome};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::pixels::PixelGrid;
use crate::result::{DetectionResult, OutcomeSet};
use crate::risk::assess;

/// How the six tests are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One test after another on the calling thread.
    Sequential,
    /// Fan out on the rayon pool. Same as `Sequential` without the `parallel` feature.
    Parallel,
}

impl Default for Execution {
    fn default() -> Self {
        if cfg!(feature = "parallel") { Execution::Parallel } else { Execution::Sequential }
    }
}

/// Configured LSB detector. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectorConfig,
    suite: [StatisticalTest; 6],
    execution: Execution,
}

impl Default for Detector {
    fn default() -> Self {
        Self::build(DetectorConfig::default())
    }
}

impl Detector {
    /// # Errors
    /// [`DetectError::InvalidConfig`](crate::DetectError::InvalidConfig) if the
    /// configuration fails validation.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DetectorConfig) -> Self {
        let suite = config.tests.tests();
        Self { config, suite, execution: Execution::default() }
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze a decoded grid. `file_size_bytes` is the size of the encoded
    /// file and only affects the small-file caveat.
    pub fn detect(&self, grid: &PixelGrid, file_size_bytes: u64) -> DetectionResult {
        self.detect_with(grid, file_size_bytes, |test| test.execute(grid))
    }

    fn detect_with<F>(&self, grid: &PixelGrid, file_size_bytes: u64, execute: F) -> DetectionResult
    where
        F: Fn(&StatisticalTest) -> TestOutcome + Sync,
    {
        let start = Instant::now();
        let span = info_span!(
            "detect",
            width = grid.width(),
            height = grid.height(),
            profile = %self.config.policy.name
        );
        let _guard = span.enter();

        let outcomes = match self.run_suite(execute) {
            Ok(outcomes) => outcomes,
            Err((test, message)) => {
                error!(%test, %message, "statistical test panicked");
                return DetectionResult::failed(
                    format!("internal error in {test}: {message}"),
                    start.elapsed(),
                );
            }
        };

        for (id, o) in outcomes.iter() {
            debug!(test = %id, score = o.score, ratio = o.ratio(), suspicious = o.is_suspicious, "outcome");
        }

        let assessment = assess(&outcomes, file_size_bytes, &self.config.policy);
        info!(
            risk = %assessment.risk_level,
            confidence = assessment.overall_confidence,
            suspicious = assessment.is_suspicious,
            "verdict"
        );
        DetectionResult::from_assessment(outcomes, assessment, start.elapsed())
    }

    fn run_suite<F>(&self, execute: F) -> std::result::Result<OutcomeSet, (TestId, String)>
    where
        F: Fn(&StatisticalTest) -> TestOutcome + Sync,
    {
        let run_one = |test: &StatisticalTest| -> std::result::Result<TestOutcome, (TestId, String)> {
            panic::catch_unwind(AssertUnwindSafe(|| execute(test)))
                .map_err(|payload| (test.id(), panic_message(payload.as_ref())))
        };

        let results: Vec<_> = match self.execution {
            #[cfg(feature = "parallel")]
            Execution::Parallel => self.suite.par_iter().map(run_one).collect(),
            _ => self.suite.iter().map(run_one).collect(),
        };
        results.into_iter().collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "decode")]
mod decode {
    use std::path::Path;
    use std::time::Instant;

    use tracing::{info_span, warn};

    use super::Detector;
    use crate::error::DetectError;
    use crate::pixels::PixelGrid;
    use crate::result::{millis, DetectionResult};

    impl Detector {
        /// Read, decode and analyze an image file.
        pub fn detect_file(&self, path: impl AsRef<Path>) -> DetectionResult {
            let start = Instant::now();
            let path = path.as_ref();
            let span = info_span!("detect_file", path = %path.display());
            let _guard = span.enter();

            match std::fs::read(path) {
                Ok(bytes) => self.detect_encoded(&bytes, start),
                Err(source) => {
                    let e = DetectError::Io { path: path.to_path_buf(), source };
                    warn!(error = %e, "cannot read image");
                    DetectionResult::failed(e, start.elapsed())
                }
            }
        }

        /// Decode and analyze an in-memory encoded image.
        pub fn detect_bytes(&self, bytes: &[u8]) -> DetectionResult {
            self.detect_encoded(bytes, Instant::now())
        }

        fn detect_encoded(&self, bytes: &[u8], start: Instant) -> DetectionResult {
            match PixelGrid::decode(bytes) {
                Ok(grid) => {
                    let mut result = self.detect(&grid, bytes.len() as u64);
                    result.processing_time_ms = millis(start.elapsed());
                    result
                }
                Err(e) => {
                    warn!(error = %e, "image decode failed");
                    DetectionResult::failed(e, start.elapsed())
                }
            }
        }
    }
}
