// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Black-and-white preprocessing for OCR — adaptive (local mean) and global
// (Otsu) thresholding.

use image::{DynamicImage, GrayImage, Luma};
use snapfind_core::config::BinarizeMethod;
use tracing::{debug, instrument};

/// Ink value in binarized output.
pub const INK: u8 = 0;
/// Paper value in binarized output.
pub const PAPER: u8 = 255;

/// Reduces photos to pure black-and-white images for the OCR engine.
#[derive(Debug, Clone, Copy)]
pub struct Binarizer {
    method: BinarizeMethod,
}

impl Binarizer {
    pub fn new(method: BinarizeMethod) -> Self {
        Self { method }
    }

    /// Produce a binary image where every pixel is [`INK`] or [`PAPER`].
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), method = ?self.method))]
    pub fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        match self.method {
            BinarizeMethod::Adaptive {
                block_radius,
                offset,
            } => adaptive_threshold(&gray, block_radius, offset),
            BinarizeMethod::Otsu => {
                let threshold = otsu_threshold(&gray);
                debug!(threshold, "Otsu threshold computed");
                global_threshold(&gray, threshold)
            }
        }
    }
}

impl Default for Binarizer {
    fn default() -> Self {
        Self::new(BinarizeMethod::Adaptive {
            block_radius: 15,
            offset: 10,
        })
    }
}

/// Whether a binarized image contains any ink at all.
pub fn has_ink(binary: &GrayImage) -> bool {
    binary.pixels().any(|p| p.0[0] == INK)
}

/// For each pixel, the threshold is the mean intensity of its neighbourhood
/// minus `offset`. Darker pixels become ink.
fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let sums = SummedArea::of(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let threshold = (sums.window_mean(x, y, block_radius) as i32 - offset).clamp(0, 255);
        ink_below(gray.get_pixel(x, y).0[0], threshold as u8)
    })
}

fn global_threshold(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        ink_below(gray.get_pixel(x, y).0[0], threshold)
    })
}

fn ink_below(value: u8, threshold: u8) -> Luma<u8> {
    Luma([if value < threshold { INK } else { PAPER }])
}

/// Running sums over the image so any window total costs four lookups.
///
/// Row and column 0 are zero, so entry `(x, y)` holds the sum of every
/// pixel strictly above and to the left of it.
struct SummedArea {
    width: u32,
    height: u32,
    sums: Vec<u64>,
}

impl SummedArea {
    fn of(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];

        for (y, row) in gray.rows().enumerate() {
            let (above, below) = sums.split_at_mut((y + 1) * stride);
            let above = &above[y * stride..];
            let current = &mut below[..stride];
            let mut running = 0u64;
            for (x, pixel) in row.enumerate() {
                running += u64::from(pixel.0[0]);
                current[x + 1] = above[x + 1] + running;
            }
        }

        Self { width, height, sums }
    }

    fn at(&self, x: usize, y: usize) -> u64 {
        self.sums[y * (self.width as usize + 1) + x]
    }

    /// Mean of the `(2r + 1)`-wide square around `(cx, cy)`, cut to the image.
    fn window_mean(&self, cx: u32, cy: u32, radius: u32) -> u64 {
        let left = cx.saturating_sub(radius) as usize;
        let top = cy.saturating_sub(radius) as usize;
        let right = cx.saturating_add(radius).saturating_add(1).min(self.width) as usize;
        let bottom = cy.saturating_add(radius).saturating_add(1).min(self.height) as usize;

        let area = ((right - left) * (bottom - top)) as u64;
        if area == 0 {
            return 128;
        }
        let total = self.at(right, bottom) + self.at(left, top)
            - self.at(right, top)
            - self.at(left, bottom);
        total / area
    }
}

/// Grey-level counts of an image.
struct Histogram {
    counts: [u64; 256],
    total: u64,
}

impl Histogram {
    fn of(gray: &GrayImage) -> Self {
        let mut counts = [0u64; 256];
        gray.pixels().for_each(|p| counts[usize::from(p.0[0])] += 1);
        Self {
            counts,
            total: counts.iter().sum(),
        }
    }

    /// Otsu's split: the threshold maximising between-class variance.
    ///
    /// Values strictly below the result are the dark class. A single-level
    /// image yields 0, so nothing turns to ink.
    fn otsu(&self) -> u8 {
        let weighted_total: f64 = self
            .counts
            .iter()
            .zip(0u32..)
            .map(|(&count, level)| f64::from(level) * count as f64)
            .sum();

        let mut dark_count = 0u64;
        let mut dark_weighted = 0.0f64;
        let mut best = (0.0f64, 0u8);

        for (level, &count) in (0u8..=255).zip(self.counts.iter()) {
            dark_count += count;
            dark_weighted += f64::from(level) * count as f64;
            let light_count = self.total - dark_count;
            if dark_count == 0 {
                continue;
            }
            if light_count == 0 {
                break;
            }

            let dark_mean = dark_weighted / dark_count as f64;
            let light_mean = (weighted_total - dark_weighted) / light_count as f64;
            let spread = dark_count as f64 * light_count as f64 * (dark_mean - light_mean).powi(2);
            if spread > best.0 {
                best = (spread, level.saturating_add(1));
            }
        }
        best.1
    }
}

fn otsu_threshold(gray: &GrayImage) -> u8 {
    Histogram::of(gray).otsu()
}
