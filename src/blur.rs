// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! 5x5 Gaussian smoothing applied as two separable 1D passes.
//!
//! The kernel is the binomial `[1, 4, 6, 4, 1] / 16`, the standard 5-tap
//! Gaussian (sigma about 1.1). Both passes accumulate in integers and the
//! result is rounded once, so the output is exact and reproducible.
//! Borders replicate the outermost pixel.

use crate::{
    error::{Error, Stage},
    image::{alloc_buffer, Image, GREY},
};
use rayon::prelude::*;
use tracing::debug_span;

/// Binomial 5-tap Gaussian weights, summing to 16.
pub const GAUSSIAN_5TAP: [u32; 5] = [1, 4, 6, 4, 1];

const RADIUS: usize = GAUSSIAN_5TAP.len() / 2;

/// Replicate border: clamp `i + offset - RADIUS` into `0..len`.
#[inline]
fn clamp_index(i: usize, offset: usize, len: usize) -> usize {
    (i + offset).saturating_sub(RADIUS).min(len - 1)
}

/// Stage 3: smooths a GREY image with the 5x5 Gaussian.
pub fn gaussian_blur(src: &Image) -> Result<Image, Error> {
    src.expect_format(GREY)?;
    let _span = debug_span!("gaussian_blur", width = src.width(), height = src.height()).entered();

    let (w, h) = (src.width() as usize, src.height() as usize);
    let pixels = src.as_slice();

    // Horizontal pass, values scaled by 16.
    let mut tmp: Vec<u16> = alloc_buffer(w * h, 0, Some(Stage::Blur))?;
    tmp.par_chunks_mut(w).enumerate().for_each(|(y, out)| {
        let row = &pixels[y * w..(y + 1) * w];
        for (x, o) in out.iter_mut().enumerate() {
            let mut sum = 0u32;
            for (k, &tap) in GAUSSIAN_5TAP.iter().enumerate() {
                sum += tap * row[clamp_index(x, k, w)] as u32;
            }
            *o = sum as u16;
        }
    });

    // Vertical pass, values scaled by 256 then rounded back to 8 bits.
    let mut dst = Image::alloc(src.width(), src.height(), GREY, Stage::Blur)?;
    dst.as_slice_mut()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, out)| {
            let rows: [&[u16]; 5] = core::array::from_fn(|k| {
                let yy = clamp_index(y, k, h);
                &tmp[yy * w..(yy + 1) * w]
            });
            for (x, o) in out.iter_mut().enumerate() {
                let sum: u32 = GAUSSIAN_5TAP
                    .iter()
                    .zip(rows.iter())
                    .map(|(&tap, row)| tap * row[x] as u32)
                    .sum();
                *o = ((sum + 128) >> 8) as u8;
            }
        });

    Ok(dst)
}
