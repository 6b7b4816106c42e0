// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Scan image files for LSB steganography.
//!
//! Usage: cargo run --example scan_image -- [--legacy] [--config cfg.json] [--json] <image>...
//!
//! Set `RUST_LOG=phasm_detect=debug` to see per-test outcomes.

use phasm_detect::{Detector, DetectorConfig, Profile};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = DetectorConfig::profile(Profile::Enhanced);
    let mut json = false;
    let mut paths = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--legacy" => config = DetectorConfig::profile(Profile::Legacy),
            "--json" => json = true,
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("--config needs a file");
                    std::process::exit(2);
                };
                config = match DetectorConfig::load(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("{e}");
                        std::process::exit(2);
                    }
                };
            }
            _ => paths.push(arg),
        }
    }

    if paths.is_empty() {
        eprintln!("Usage: scan_image [--legacy] [--config cfg.json] [--json] <image>...");
        std::process::exit(2);
    }

    let detector = match Detector::new(config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let mut flagged = 0;
    for path in &paths {
        let result = detector.detect_file(path);
        if result.is_suspicious {
            flagged += 1;
        }
        if json {
            match result.to_json() {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("{path}: {e}"),
            }
            continue;
        }
        println!(
            "{path}: {} ({:.1}%, {} ms)",
            result.risk_level, result.overall_confidence, result.processing_time_ms
        );
        for (_, o) in result.outcomes.iter() {
            let mark = if o.is_suspicious { "!" } else { " " };
            println!("  {mark} {:<28} {:>12.6} / {:<8} {}", o.name, o.score, o.threshold, o.interpretation);
        }
        for line in result.summary.lines() {
            println!("  {line}");
        }
        println!();
    }

    eprintln!("{flagged} of {} image(s) flagged", paths.len());
}
