// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Color space conversions at both ends of the edge pipeline.
//!
//! All conversions use fixed-point integer arithmetic so results are
//! bit-identical regardless of how rows are scheduled across threads.

use crate::{
    error::{Error, FormatError, Stage},
    image::{is_yuv420, Image, FourCC, GREY, I420, NV12, NV21, RGB3, RGBA},
};
use rayon::prelude::*;
use tracing::debug_span;

// BT.601 full range (JFIF) coefficients in 16.16 fixed point.
const CR_TO_R: i32 = 91_881; // 1.402
const CB_TO_G: i32 = 22_554; // 0.344136
const CR_TO_G: i32 = 46_802; // 0.714136
const CB_TO_B: i32 = 116_130; // 1.772
const HALF: i32 = 1 << 15;

// Luma weights 0.299, 0.587, 0.114 scaled to a sum of 256.
const R_WEIGHT: u32 = 77;
const G_WEIGHT: u32 = 150;
const B_WEIGHT: u32 = 29;

/// Value written for edge pixels in the edge map.
pub const EDGE: u8 = 255;

/// RGBA written for edge pixels: opaque white.
pub const EDGE_RGBA: [u8; 4] = [255, 255, 255, 255];

/// RGBA written for non-edge pixels: opaque black.
pub const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

/// Where the chroma samples of a 4:2:0 frame live.
#[derive(Copy, Clone, Debug)]
enum Chroma {
    /// One interleaved plane after luma; `u_first` distinguishes NV12 from NV21.
    Interleaved { u_first: bool },
    /// Separate U then V planes of quarter size.
    Planar,
}

impl Chroma {
    fn for_format(format: FourCC) -> Option<Self> {
        match format {
            NV12 => Some(Chroma::Interleaved { u_first: true }),
            NV21 => Some(Chroma::Interleaved { u_first: false }),
            I420 => Some(Chroma::Planar),
            _ => None,
        }
    }
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn yuv_to_rgb_pixel(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = (y as i32) << 16;
    let cb = u as i32 - 128;
    let cr = v as i32 - 128;
    [
        clamp_u8((y + CR_TO_R * cr + HALF) >> 16),
        clamp_u8((y - CB_TO_G * cb - CR_TO_G * cr + HALF) >> 16),
        clamp_u8((y + CB_TO_B * cb + HALF) >> 16),
    ]
}

/// Converts a validated 4:2:0 buffer to packed RGB.
///
/// `src` must hold exactly `image_size(width, height, format)` bytes; the
/// callers check this before getting here.
pub(crate) fn yuv420_to_rgb_slice(
    src: &[u8],
    width: u32,
    height: u32,
    format: FourCC,
) -> Result<Image, Error> {
    let chroma = Chroma::for_format(format).ok_or(FormatError::UnsupportedFormat(format))?;
    let _span = debug_span!("yuv_to_rgb", %format, width, height).entered();

    let mut dst = Image::alloc(width, height, RGB3, Stage::ColorConvert)?;
    let (w, h) = (width as usize, height as usize);
    let (luma, chroma_planes) = src.split_at(w * h);
    let quarter = (w / 2) * (h / 2);

    dst.as_slice_mut()
        .par_chunks_mut(w * 3)
        .enumerate()
        .for_each(|(y, out)| {
            let luma_row = &luma[y * w..(y + 1) * w];
            let cy = y / 2;
            for (x, (px, &l)) in out.chunks_exact_mut(3).zip(luma_row).enumerate() {
                let (u, v) = match chroma {
                    Chroma::Interleaved { u_first } => {
                        let idx = cy * w + (x & !1);
                        let (a, b) = (chroma_planes[idx], chroma_planes[idx + 1]);
                        if u_first {
                            (a, b)
                        } else {
                            (b, a)
                        }
                    }
                    Chroma::Planar => {
                        let idx = cy * (w / 2) + x / 2;
                        (chroma_planes[idx], chroma_planes[quarter + idx])
                    }
                };
                px.copy_from_slice(&yuv_to_rgb_pixel(l, u, v));
            }
        });

    Ok(dst)
}

/// Stage 1: converts an NV21, NV12 or I420 image to RGB3.
pub fn yuv_to_rgb(src: &Image) -> Result<Image, Error> {
    if !is_yuv420(src.format()) {
        return Err(FormatError::UnsupportedFormat(src.format()).into());
    }
    yuv420_to_rgb_slice(src.as_slice(), src.width(), src.height(), src.format())
}

/// Stage 2: reduces an RGB3 image to GREY using BT.601 luma weights.
pub fn rgb_to_gray(src: &Image) -> Result<Image, Error> {
    src.expect_format(RGB3)?;
    let _span = debug_span!("rgb_to_gray", width = src.width(), height = src.height()).entered();

    let mut dst = Image::alloc(src.width(), src.height(), GREY, Stage::Grayscale)?;
    let w = src.width() as usize;
    dst.as_slice_mut()
        .par_chunks_mut(w)
        .zip(src.as_slice().par_chunks(w * 3))
        .for_each(|(out, row)| {
            for (g, px) in out.iter_mut().zip(row.chunks_exact(3)) {
                let sum = R_WEIGHT * px[0] as u32 + G_WEIGHT * px[1] as u32 + B_WEIGHT * px[2] as u32;
                *g = ((sum + 128) >> 8) as u8;
            }
        });

    Ok(dst)
}

/// Stage 5: fans a GREY edge map out to RGBA.
///
/// Pixels equal to [`EDGE`] become [`EDGE_RGBA`], everything else
/// [`BACKGROUND_RGBA`].
pub fn edges_to_rgba(edges: &Image) -> Result<Image, Error> {
    edges.expect_format(GREY)?;
    let _span = debug_span!("edges_to_rgba", width = edges.width(), height = edges.height()).entered();

    let mut dst = Image::alloc(edges.width(), edges.height(), RGBA, Stage::Rgba)?;
    let w = edges.width() as usize;
    dst.as_slice_mut()
        .par_chunks_mut(w * 4)
        .zip(edges.as_slice().par_chunks(w))
        .for_each(|(out, row)| {
            for (px, &e) in out.chunks_exact_mut(4).zip(row) {
                px.copy_from_slice(if e == EDGE { &EDGE_RGBA } else { &BACKGROUND_RGBA });
            }
        });

    Ok(dst)
}
