// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    blur::gaussian_blur,
    canny::canny,
    convert::{edges_to_rgba, rgb_to_gray, yuv420_to_rgb_slice, EDGE},
    error::{Error, FormatError, Stage},
    image::{check_frame_size, is_yuv420, FourCC, Image, NV21},
};
use std::time::{Duration, Instant};
use tracing::{debug, debug_span};

/// Timings and counters for one processed frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub width: u32,
    pub height: u32,
    /// Wall time of each stage, indexed in [`Stage::ALL`] order
    pub stages: [Duration; 5],
    /// Wall time of the whole call including validation
    pub total: Duration,
    /// Number of pixels classified as edges
    pub edge_pixels: usize,
}

impl ProcessStats {
    pub fn stage(&self, stage: Stage) -> Duration {
        self.stages[stage as usize]
    }
}

fn timed<T>(
    stats: &mut ProcessStats,
    stage: Stage,
    f: impl FnOnce() -> Result<T, Error>,
) -> Result<T, Error> {
    let now = Instant::now();
    let out = f()?;
    stats.stages[stage as usize] = now.elapsed();
    Ok(out)
}

/// Converts raw camera frames into an RGBA edge visualization.
///
/// The processor is stateless apart from the input layout it was built
/// for; it may be shared across threads and called concurrently. Every call
/// allocates its own intermediate buffers and releases them on return.
///
/// Pipeline, strictly in order:
///
/// 1. YUV 4:2:0 to RGB (BT.601 full range)
/// 2. RGB to grayscale (0.299, 0.587, 0.114)
/// 3. 5x5 Gaussian blur, replicated borders
/// 4. Canny: Sobel, non-maximum suppression, hysteresis (50 / 150)
/// 5. Edge map to RGBA: edges opaque white, everything else opaque black
///
/// # Example
///
/// ```
/// use edgefirst_edges::FrameEdgeProcessor;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let processor = FrameEdgeProcessor::default();
/// let frame = vec![128u8; 4 * 4 * 3 / 2];
/// let rgba = processor.process(&frame, 4, 4)?;
/// assert_eq!(rgba.len(), 4 * 4 * 4);
/// assert!(rgba.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
/// # Ok(())
/// # }
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameEdgeProcessor {
    format: FourCC,
}

impl Default for FrameEdgeProcessor {
    fn default() -> Self {
        Self { format: NV21 }
    }
}

impl FrameEdgeProcessor {
    /// Creates a processor for NV21 input, the Android camera layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor for another 4:2:0 layout (NV21, NV12 or I420).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrameFormat`] for any other format.
    pub fn with_format(format: FourCC) -> Result<Self, Error> {
        if !is_yuv420(format) {
            return Err(FormatError::UnsupportedFormat(format).into());
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    /// Processes one raw frame and returns RGBA8888 bytes,
    /// `width * height * 4` long.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFrameFormat`] if `width` or `height` is not
    ///   positive, is odd, or `frame` is not exactly
    ///   `width * height * 3 / 2` bytes. Nothing is read from `frame` in
    ///   that case.
    /// - [`Error::ProcessingFailure`] if an intermediate buffer cannot be
    ///   allocated.
    pub fn process(&self, frame: &[u8], width: i32, height: i32) -> Result<Vec<u8>, Error> {
        self.process_with_stats(frame, width, height)
            .map(|(img, _)| img.into_vec())
    }

    /// Same as [`process`](Self::process) but returns an [`Image`] and
    /// per-stage timings.
    pub fn process_with_stats(
        &self,
        frame: &[u8],
        width: i32,
        height: i32,
    ) -> Result<(Image, ProcessStats), Error> {
        let start = Instant::now();
        let (width, height) = check_frame_size(frame.len(), width, height, self.format)?;
        let _span = debug_span!("process_frame", width, height, format = %self.format).entered();

        let mut stats = ProcessStats {
            width,
            height,
            ..Default::default()
        };

        let rgb = timed(&mut stats, Stage::ColorConvert, || {
            yuv420_to_rgb_slice(frame, width, height, self.format)
        })?;
        let gray = timed(&mut stats, Stage::Grayscale, || rgb_to_gray(&rgb))?;
        drop(rgb);
        let blurred = timed(&mut stats, Stage::Blur, || gaussian_blur(&gray))?;
        drop(gray);
        let edges = timed(&mut stats, Stage::EdgeDetect, || canny(&blurred))?;
        drop(blurred);
        let rgba = timed(&mut stats, Stage::Rgba, || edges_to_rgba(&edges))?;

        stats.edge_pixels = edges.as_slice().iter().filter(|&&e| e == EDGE).count();
        stats.total = start.elapsed();

        debug!(
            "processed {}x{} {} in {:?} edges: {}",
            width, height, self.format, stats.total, stats.edge_pixels
        );

        Ok((rgba, stats))
    }

    /// Processes a frame held in an [`Image`] of the processor's format.
    pub fn process_image(&self, src: &Image) -> Result<Image, Error> {
        if src.format() != self.format {
            return Err(FormatError::UnsupportedFormat(src.format()).into());
        }
        let (width, height) = (
            i32::try_from(src.width()).map_err(|_| FormatError::TooLarge {
                width: src.width(),
                height: src.height(),
            })?,
            i32::try_from(src.height()).map_err(|_| FormatError::TooLarge {
                width: src.width(),
                height: src.height(),
            })?,
        );
        self.process_with_stats(src.as_slice(), width, height)
            .map(|(img, _)| img)
    }
}

/// Processes one NV21 frame with the default pipeline.
///
/// This is the single entry point for callers across a language boundary:
/// raw bytes and dimensions in, RGBA bytes out.
pub fn process_frame(frame: &[u8], width: i32, height: i32) -> Result<Vec<u8>, Error> {
    FrameEdgeProcessor::default().process(frame, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{I420, RGBA};

    #[test]
    fn rejects_non_yuv_format() {
        assert!(FrameEdgeProcessor::with_format(RGBA).is_err());
        assert_eq!(FrameEdgeProcessor::with_format(I420).unwrap().format(), I420);
    }

    #[test]
    fn stats_cover_every_stage() {
        let frame = vec![128u8; 8 * 8 * 3 / 2];
        let (img, stats) = FrameEdgeProcessor::new()
            .process_with_stats(&frame, 8, 8)
            .unwrap();
        assert_eq!(img.format(), RGBA);
        assert_eq!((stats.width, stats.height), (8, 8));
        assert_eq!(stats.edge_pixels, 0);
        let summed: Duration = Stage::ALL.iter().map(|&s| stats.stage(s)).sum();
        assert!(summed <= stats.total);
    }

    #[test]
    fn image_format_must_match() {
        let img = Image::new(4, 4, I420).unwrap();
        let err = FrameEdgeProcessor::new().process_image(&img).unwrap_err();
        assert!(err.is_invalid_frame_format());
    }
}
