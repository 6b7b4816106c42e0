// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RGB24 pixel grid consumed by the statistical tests.
//!
//! The grid is row-major, three bytes per pixel, and never mutated by the
//! detector. Decoding from image files lives behind the `decode` feature;
//! everything else is std only.

use crate::error::{DetectError, Result};

/// One of the three colour channels of an RGB24 pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Byte offset of this channel inside a pixel triple.
    pub const fn offset(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }
}

/// Decoded image as a `width × height` raster of `[R, G, B]` triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap raw row-major RGB24 bytes.
    ///
    /// # Errors
    /// [`DetectError::InvalidGrid`] if `data.len() != width * height * 3`
    /// or the dimensions overflow `usize`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| DetectError::InvalidGrid(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(DetectError::InvalidGrid(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.data.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major RGB24 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at column `x`, row `y`.
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    /// Rows as RGB24 byte slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let stride = (self.width as usize * 3).max(1);
        self.data.chunks_exact(stride)
    }

    /// Bytes of one channel in row-major order.
    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = u8> + '_ {
        self.data.iter().skip(channel.offset()).step_by(3).copied()
    }

    /// LSB plane of one channel (`0` or `1` per pixel), row-major.
    pub fn lsb_plane(&self, channel: Channel) -> Vec<u8> {
        self.channel(channel).map(|v| v & 1).collect()
    }

    /// Mutable access for fixture generation; the detector never writes.
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(feature = "decode")]
impl PixelGrid {
    /// Read and decode an image file into an RGB24 grid.
    ///
    /// # Errors
    /// [`DetectError::Io`] if the file cannot be read,
    /// [`DetectError::Decode`] if the codec rejects it.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Decode an in-memory encoded image (format sniffed from its header).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(img.into_rgb8().into())
    }
}

#[cfg(feature = "decode")]
impl From<image::RgbImage> for PixelGrid {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height, data: img.into_raw() }
    }
}
