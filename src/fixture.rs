// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Synthetic cover images and simple LSB embedders for calibration and tests.
//!
//! Nothing here is used by the detector itself. The embedders reproduce the
//! bit layouts of common hobby tools so that detection can be checked
//! against known ground truth:
//!
//! - [`embed_red_lsb`]: message bytes least-significant bit first, then a NUL
//!   byte, written into red-channel LSBs in row-major order.
//! - [`embed_cyclic_mirrored`]: the message repeated until the image is full,
//!   one bit per pixel copied into all three channels.
//! - [`embed_cyclic_interleaved`]: the message repeated over the flattened
//!   `R,G,B,R,G,B,…` byte stream.
//!
//! Noise comes from a fixed SplitMix64 generator rather than a seeded
//! library RNG, so fixtures are bit-identical on every platform and release.

use crate::error::{DetectError, Result};
use crate::pixels::{Channel, PixelGrid};

/// SplitMix64 generator (Steele, Lea, Flood 2014).
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u64,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Every channel of every pixel set to `value`.
pub fn flat_gray(width: u32, height: u32, value: u8) -> PixelGrid {
    PixelGrid::from_fn(width, height, |_, _| [value; 3])
}

/// Mid-gray with a gentle diagonal gradient and ±2 per-channel sensor noise.
///
/// Unlike [`flat_gray`] its LSB plane looks like a real photograph's: nearly
/// balanced, with weak neighbour correlation.
pub fn textured_gray(width: u32, height: u32, seed: u64) -> PixelGrid {
    let mut noise = NoiseSource::new(seed);
    PixelGrid::from_fn(width, height, |x, y| {
        let v = noise.next_u64();
        let base = 128 + i64::from((x + y) / 16);
        let mut px = [0u8; 3];
        for (c, out) in px.iter_mut().enumerate() {
            let n = ((v >> (16 * c)) % 5) as i64 - 2;
            *out = (base + n).clamp(0, 255) as u8;
        }
        px
    })
}

/// UTF-8 bytes of `message` as bits, least-significant bit of each byte first.
pub fn message_bits(message: &str) -> Vec<u8> {
    message
        .bytes()
        .flat_map(|b| (0..8).map(move |i| (b >> i) & 1))
        .collect()
}

/// Largest message, in bytes, that [`embed_red_lsb`] can hide in `grid`.
pub fn red_lsb_capacity(grid: &PixelGrid) -> usize {
    grid.len().saturating_sub(8) / 8
}

#[inline]
fn set_lsb(byte: &mut u8, bit: u8) {
    *byte = (*byte & 0xFE) | (bit & 1);
}

/// Hide `message` plus a NUL terminator in the red-channel LSBs.
///
/// # Errors
/// [`DetectError::CapacityExceeded`] if the grid has fewer pixels than bits.
pub fn embed_red_lsb(cover: &PixelGrid, message: &str) -> Result<PixelGrid> {
    let mut bits = message_bits(message);
    bits.extend_from_slice(&[0; 8]);
    if bits.len() > cover.len() {
        return Err(DetectError::CapacityExceeded { needed: bits.len(), available: cover.len() });
    }

    let mut stego = cover.clone();
    let red = Channel::Red.offset();
    for (px, &bit) in stego.bytes_mut().chunks_exact_mut(3).zip(&bits) {
        set_lsb(&mut px[red], bit);
    }
    Ok(stego)
}

/// Read a NUL-terminated message back out of the red-channel LSBs.
///
/// Stops at the first NUL byte or at the end of the grid. Invalid UTF-8 is
/// replaced, not rejected.
pub fn extract_red_lsb(grid: &PixelGrid) -> String {
    let bits = grid.lsb_plane(Channel::Red);
    let bytes: Vec<u8> = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | (b << i)))
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Repeat the message over the whole image, the same bit in R, G and B.
pub fn embed_cyclic_mirrored(cover: &PixelGrid, message: &str) -> PixelGrid {
    let bits = message_bits(message);
    let mut stego = cover.clone();
    if bits.is_empty() {
        return stego;
    }
    for (px, &bit) in stego.bytes_mut().chunks_exact_mut(3).zip(bits.iter().cycle()) {
        for v in px {
            set_lsb(v, bit);
        }
    }
    stego
}

/// Repeat the message over the flattened channel stream.
pub fn embed_cyclic_interleaved(cover: &PixelGrid, message: &str) -> PixelGrid {
    let bits = message_bits(message);
    let mut stego = cover.clone();
    if bits.is_empty() {
        return stego;
    }
    for (v, &bit) in stego.bytes_mut().iter_mut().zip(bits.iter().cycle()) {
        set_lsb(v, bit);
    }
    stego
}
