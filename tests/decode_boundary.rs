// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Image-file boundary: decode, analyze, and degrade gracefully on failure.

#![cfg(feature = "decode")]

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use phasm_detect::fixture::{embed_cyclic_mirrored, textured_gray};
use phasm_detect::{DetectionResult, Detector, PixelGrid, RiskLevel};

fn encode(grid: &PixelGrid, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_raw(grid.width(), grid.height(), grid.as_bytes().to_vec()).unwrap();
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn without_timing(mut r: DetectionResult) -> DetectionResult {
    r.processing_time_ms = 0;
    r
}

#[test]
fn lossless_formats_decode_to_the_same_grid() {
    let grid = textured_gray(48, 32, 3);
    for format in [ImageFormat::Png, ImageFormat::Bmp] {
        let bytes = encode(&grid, format);
        assert_eq!(PixelGrid::decode(&bytes).unwrap(), grid, "{format:?}");
    }
}

#[test]
fn detect_bytes_matches_detect_on_grid() {
    let grid = embed_cyclic_mirrored(&textured_gray(64, 64, 7), "HIDDEN DATA");
    let png = encode(&grid, ImageFormat::Png);
    let detector = Detector::default();

    let from_bytes = without_timing(detector.detect_bytes(&png));
    let from_grid = without_timing(detector.detect(&grid, png.len() as u64));
    assert_eq!(from_bytes, from_grid);
    assert_eq!(from_bytes.risk_level, RiskLevel::VeryHigh);
    // a 64×64 PNG is far below 0.5 MB
    assert!(from_bytes.summary.contains("Small file size"));
}

#[test]
fn detect_file_reads_from_disk() {
    let dir = std::env::temp_dir().join(format!("phasm-detect-img-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("control.png");
    let grid = textured_gray(64, 64, 7);
    std::fs::write(&path, encode(&grid, ImageFormat::Png)).unwrap();

    let r = Detector::default().detect_file(&path);
    assert!(!r.is_failure());
    assert_eq!(r.risk_level, RiskLevel::Low);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn garbage_bytes_give_failed_result() {
    let r = Detector::default().detect_bytes(b"definitely not an image");
    assert!(r.is_failure());
    assert!(!r.is_suspicious);
    assert_eq!(r.overall_confidence, 0.0);
    assert_eq!(r.risk_level, RiskLevel::Low);
    assert!(r.outcomes.is_empty());
    assert!(r.summary.starts_with("Error analyzing image: "), "{}", r.summary);
    assert!(r.summary.len() > "Error analyzing image: ".len());
}

#[test]
fn truncated_png_gives_failed_result() {
    let png = encode(&textured_gray(32, 32, 1), ImageFormat::Png);
    let r = Detector::default().detect_bytes(&png[..png.len() / 2]);
    assert!(r.is_failure());
    assert!(r.summary.starts_with("Error analyzing image: "));
}

#[test]
fn missing_file_names_the_path() {
    let r = Detector::default().detect_file("/no/such/dir/cover.png");
    assert!(r.is_failure());
    assert!(r.summary.contains("/no/such/dir/cover.png"), "{}", r.summary);
}

#[test]
fn decode_error_message_is_verbatim() {
    let err = PixelGrid::decode(&[0u8; 16]).unwrap_err();
    let msg = err.to_string();
    let direct = image::load_from_memory(&[0u8; 16]).unwrap_err().to_string();
    assert_eq!(msg, direct);
}
