// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::FourCC;
use core::fmt;
use std::collections::TryReserveError;

/// Pipeline stage, used to attribute failures and timings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// YUV 4:2:0 to RGB conversion
    ColorConvert,
    /// RGB to single channel luminance
    Grayscale,
    /// 5x5 Gaussian smoothing
    Blur,
    /// Sobel, non-maximum suppression and hysteresis
    EdgeDetect,
    /// Edge map to RGBA for display
    Rgba,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::ColorConvert,
        Stage::Grayscale,
        Stage::Blur,
        Stage::EdgeDetect,
        Stage::Rgba,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ColorConvert => "convert",
            Stage::Grayscale => "grayscale",
            Stage::Blur => "blur",
            Stage::EdgeDetect => "edges",
            Stage::Rgba => "rgba",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason a frame was rejected before processing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// Width or height is zero or negative.
    NonPositiveDimensions { width: i64, height: i64 },
    /// 4:2:0 chroma subsampling needs even width and height.
    OddDimensions { width: u32, height: u32 },
    /// Buffer length does not match the declared geometry.
    SizeMismatch { expected: usize, actual: usize },
    /// The stage or processor does not accept this pixel format.
    UnsupportedFormat(FourCC),
    /// The frame size does not fit in memory addressing.
    TooLarge { width: u32, height: u32 },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveDimensions { width, height } => {
                write!(f, "non-positive dimensions {width}x{height}")
            }
            Self::OddDimensions { width, height } => {
                write!(f, "4:2:0 frame needs even dimensions, got {width}x{height}")
            }
            Self::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} bytes but buffer holds {actual}")
            }
            Self::UnsupportedFormat(format) => write!(f, "unsupported pixel format {format}"),
            Self::TooLarge { width, height } => write!(f, "frame {width}x{height} is too large"),
        }
    }
}

/// Top-level crate error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The input frame is malformed. Raised before any pixel is read.
    InvalidFrameFormat(FormatError),
    /// A stage could not complete, for example an intermediate buffer
    /// could not be allocated. `stage` is `None` for buffers allocated
    /// outside the pipeline, such as through [`Image::new`].
    ///
    /// [`Image::new`]: crate::image::Image::new
    ProcessingFailure {
        stage: Option<Stage>,
        source: TryReserveError,
    },
}

impl Error {
    pub fn is_invalid_frame_format(&self) -> bool {
        matches!(self, Self::InvalidFrameFormat(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameFormat(e) => write!(f, "invalid frame format: {e}"),
            Self::ProcessingFailure {
                stage: Some(stage),
                source,
            } => write!(f, "processing failure in {stage} stage: {source}"),
            Self::ProcessingFailure {
                stage: None,
                source,
            } => write!(f, "processing failure: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProcessingFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::InvalidFrameFormat(e)
    }
}
