// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Canny edge extraction on a smoothed GREY image.
//!
//! - Sobel 3x3 gradients with replicated borders, L1 magnitude
//!   `|gx| + |gy|`.
//! - Non-maximum suppression along the gradient direction quantized to
//!   0°, 45°, 90° and 135° with a fixed-point tan(22.5°) sector test.
//!   Magnitudes outside the image count as zero.
//! - Double threshold: above [`HIGH_THRESHOLD`] is strong, above
//!   [`LOW_THRESHOLD`] is weak; weak pixels 8-connected to a strong pixel
//!   are promoted, the rest are dropped.
//!
//! On a plateau of equal magnitudes across the edge only one pixel
//! survives: a pixel must be strictly greater than its left (upper)
//! neighbour and greater or equal to its right (lower) neighbour.

use crate::{
    convert::EDGE,
    error::{Error, Stage},
    image::{alloc_buffer, Image, GREY},
};
use rayon::prelude::*;
use tracing::debug_span;

/// Gradient magnitude at or below which a pixel is never an edge.
pub const LOW_THRESHOLD: i32 = 50;

/// Gradient magnitude above which a pixel is a strong edge.
pub const HIGH_THRESHOLD: i32 = 150;

// tan(22.5°) in 1.15 fixed point.
const TG22: i32 = 13_573;

const NOT_EDGE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Per-pixel Sobel responses.
#[derive(Clone, Debug)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    /// Horizontal derivative, positive when intensity grows to the right
    pub gx: Vec<i16>,
    /// Vertical derivative, positive when intensity grows downwards
    pub gy: Vec<i16>,
    /// L1 magnitude `|gx| + |gy|`
    pub mag: Vec<i32>,
}

impl Gradients {
    #[inline]
    fn mag_at(&self, x: isize, y: isize) -> i32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.mag[y as usize * self.width + x as usize]
    }
}

/// Computes Sobel gradients of a GREY image.
pub fn sobel(src: &Image) -> Result<Gradients, Error> {
    src.expect_format(GREY)?;
    let _span = debug_span!("sobel", width = src.width(), height = src.height()).entered();

    let (w, h) = (src.width() as usize, src.height() as usize);
    let pixels = src.as_slice();
    let mut gx: Vec<i16> = alloc_buffer(w * h, 0, Some(Stage::EdgeDetect))?;
    let mut gy: Vec<i16> = alloc_buffer(w * h, 0, Some(Stage::EdgeDetect))?;
    let mut mag: Vec<i32> = alloc_buffer(w * h, 0, Some(Stage::EdgeDetect))?;

    gx.par_chunks_mut(w)
        .zip(gy.par_chunks_mut(w))
        .zip(mag.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, ((out_gx, out_gy), out_mag))| {
            let row = |yy: usize| &pixels[yy * w..(yy + 1) * w];
            let rows = [row(y.saturating_sub(1)), row(y), row((y + 1).min(h - 1))];
            for x in 0..w {
                let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
                let p = |r: usize, c: usize| rows[r][xs[c]] as i32;

                let dx = (p(0, 2) + 2 * p(1, 2) + p(2, 2)) - (p(0, 0) + 2 * p(1, 0) + p(2, 0));
                let dy = (p(2, 0) + 2 * p(2, 1) + p(2, 2)) - (p(0, 0) + 2 * p(0, 1) + p(0, 2));

                out_gx[x] = dx as i16;
                out_gy[x] = dy as i16;
                out_mag[x] = dx.abs() + dy.abs();
            }
        });

    Ok(Gradients {
        width: w,
        height: h,
        gx,
        gy,
        mag,
    })
}

/// Classifies every pixel as strong, weak or not an edge after
/// non-maximum suppression.
fn suppress(grad: &Gradients, low: i32, high: i32) -> Result<Vec<u8>, Error> {
    let (w, h) = (grad.width, grad.height);
    let mut class: Vec<u8> = alloc_buffer(w * h, NOT_EDGE, Some(Stage::EdgeDetect))?;

    class.par_chunks_mut(w).enumerate().for_each(|(y, out)| {
        let yi = y as isize;
        for (x, c) in out.iter_mut().enumerate() {
            let idx = y * w + x;
            let m = grad.mag[idx];
            if m <= low {
                continue;
            }
            let xi = x as isize;
            let (sx, sy) = (grad.gx[idx] as i32, grad.gy[idx] as i32);
            let (ax, ay) = (sx.abs(), sy.abs());
            let ay15 = ay << 15;
            let tg22x = ax * TG22;

            let is_max = if ay15 < tg22x {
                m > grad.mag_at(xi - 1, yi) && m >= grad.mag_at(xi + 1, yi)
            } else if ay15 > tg22x + (ax << 16) {
                m > grad.mag_at(xi, yi - 1) && m >= grad.mag_at(xi, yi + 1)
            } else {
                let s = if (sx ^ sy) < 0 { -1 } else { 1 };
                m > grad.mag_at(xi - s, yi - 1) && m > grad.mag_at(xi + s, yi + 1)
            };

            if is_max {
                *c = if m > high { STRONG } else { WEAK };
            }
        }
    });

    Ok(class)
}

fn push(stack: &mut Vec<usize>, idx: usize) -> Result<(), Error> {
    stack
        .try_reserve(1)
        .map_err(|source| Error::ProcessingFailure {
            stage: Some(Stage::EdgeDetect),
            source,
        })?;
    stack.push(idx);
    Ok(())
}

/// Promotes weak pixels connected to strong ones and writes the edge map.
fn hysteresis(mut class: Vec<u8>, width: u32, height: u32) -> Result<Image, Error> {
    let (w, h) = (width as usize, height as usize);
    let mut stack = Vec::new();
    for (idx, &c) in class.iter().enumerate() {
        if c == STRONG {
            push(&mut stack, idx)?;
        }
    }

    let mut dst = Image::alloc(width, height, GREY, Stage::EdgeDetect)?;
    let edges = dst.as_slice_mut();
    while let Some(idx) = stack.pop() {
        edges[idx] = EDGE;
        let (x, y) = (idx % w, idx / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let n = ny * w + nx;
                if class[n] == WEAK {
                    class[n] = STRONG;
                    push(&mut stack, n)?;
                }
            }
        }
    }

    Ok(dst)
}

/// Stage 4: extracts a binary edge map from a smoothed GREY image.
///
/// The result is GREY with [`EDGE`] on edge pixels and 0 elsewhere.
pub fn canny(src: &Image) -> Result<Image, Error> {
    let grad = sobel(src)?;
    let _span = debug_span!("canny", low = LOW_THRESHOLD, high = HIGH_THRESHOLD).entered();
    let class = suppress(&grad, LOW_THRESHOLD, HIGH_THRESHOLD)?;
    hysteresis(class, src.width(), src.height())
}
