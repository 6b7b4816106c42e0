// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for pixel-grid construction, decoding and configuration.
//!
//! Detection itself never returns [`DetectError`]: the orchestrator folds
//! every failure into a neutral [`DetectionResult`](crate::DetectionResult)
//! so batch callers can keep going.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the crate boundary.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Raw pixel data does not describe a `width × height` RGB24 raster.
    #[error("invalid pixel grid: {0}")]
    InvalidGrid(String),

    /// The image codec could not decode the input. The codec's message is
    /// kept verbatim so it can be shown to the user.
    #[error("{0}")]
    Decode(String),

    /// The image or configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document is not valid JSON for
    /// [`DetectorConfig`](crate::DetectorConfig), or a value could not be
    /// written as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixture message does not fit into the cover grid.
    #[error("message needs {needed} LSB slots but the grid offers {available}")]
    CapacityExceeded { needed: usize, available: usize },
}

#[cfg(feature = "decode")]
impl From<image::ImageError> for DetectError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_message_is_verbatim() {
        let e = DetectError::Decode("unsupported format".into());
        assert_eq!(e.to_string(), "unsupported format");
    }

    #[test]
    fn io_error_names_path() {
        let e = DetectError::Io {
            path: PathBuf::from("/nope/cover.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/nope/cover.png"), "{msg}");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn capacity_message() {
        let e = DetectError::CapacityExceeded { needed: 120, available: 64 };
        assert_eq!(e.to_string(), "message needs 120 LSB slots but the grid offers 64");
    }
}
