// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Edge Detection Library
//!
//! This library turns raw camera frames into a displayable edge
//! visualization. A frame arrives as YUV 4:2:0 bytes with its width and
//! height and leaves as RGBA8888 bytes of the same pixel dimensions, with
//! edges drawn opaque white on opaque black.
//!
//! ## Pipeline
//!
//! - **Color conversion**: YUV 4:2:0 (NV21 by default, NV12 or I420) to
//!   RGB using BT.601 full range coefficients.
//! - **Grayscale**: luma weighted reduction to a single channel.
//! - **Smoothing**: 5x5 Gaussian blur with replicated borders.
//! - **Edge extraction**: Canny with Sobel gradients, non-maximum
//!   suppression and hysteresis between fixed thresholds.
//! - **Display conversion**: edge map to RGBA.
//!
//! Every stage works in integer arithmetic. Rows are processed in parallel
//! with rayon but the output is bit-identical to a sequential run, and
//! repeated calls on the same input produce the same bytes.
//!
//! ## Example
//!
//! ```
//! use edgefirst_edges::{process_frame, Error};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (640, 480);
//! let frame = vec![128u8; width * height * 3 / 2];
//! let rgba = process_frame(&frame, width as i32, height as i32)?;
//! assert_eq!(rgba.len(), width * height * 4);
//!
//! // Truncated buffers are rejected before any processing.
//! let err = process_frame(&frame[1..], width as i32, height as i32).unwrap_err();
//! assert!(matches!(err, Error::InvalidFrameFormat(_)));
//! # Ok(())
//! # }
//! ```
//!
//! The individual stages are exposed in [`convert`], [`blur`] and [`canny`]
//! for callers that want intermediate results.

pub mod blur;
pub mod canny;
pub mod convert;
pub mod error;
pub mod image;
pub mod processor;

pub use error::{Error, FormatError, Stage};
pub use image::{FourCC, Image};
pub use processor::{process_frame, FrameEdgeProcessor, ProcessStats};
