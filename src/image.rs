// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, FormatError, Stage};
use core::fmt;

/// Four character pixel format code as used by V4L2 and Android.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in &self.0 {
            let c = if c.is_ascii_graphic() { c as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

/// NV21 4:2:0 YUV semi-planar format, interleaved V/U (Android camera default)
pub const NV21: FourCC = FourCC(*b"NV21");

/// NV12 4:2:0 YUV semi-planar format, interleaved U/V
pub const NV12: FourCC = FourCC(*b"NV12");

/// I420 4:2:0 YUV planar format, full U plane followed by full V plane
pub const I420: FourCC = FourCC(*b"I420");

/// RGB 24-bit pixel format (8 bits per channel, no alpha)
pub const RGB3: FourCC = FourCC(*b"RGB3");

/// Single channel 8-bit intensity
pub const GREY: FourCC = FourCC(*b"GREY");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// Returns true for the YUV 4:2:0 layouts accepted as pipeline input.
pub const fn is_yuv420(format: FourCC) -> bool {
    matches!(format, NV21 | NV12 | I420)
}

/// Bytes per row of the luma plane or the packed pixels, `None` for unknown
/// formats.
const fn format_row_stride(format: FourCC, width: usize) -> Option<usize> {
    match format {
        GREY => Some(width),
        RGB3 => width.checked_mul(3),
        RGBA => width.checked_mul(4),
        NV21 | NV12 | I420 => Some(width),
        _ => None,
    }
}

/// Total buffer size in bytes for an image of the given geometry.
///
/// 4:2:0 formats carry one chroma pair per 2x2 block on top of the luma
/// plane, `width * height * 3 / 2` bytes for even dimensions. Returns `None`
/// when the format is unknown or the size overflows.
pub fn image_size(width: u32, height: u32, format: FourCC) -> Option<usize> {
    let (w, h) = (width as usize, height as usize);
    let plane = format_row_stride(format, w)?.checked_mul(h)?;
    if is_yuv420(format) {
        let chroma = (w / 2).checked_mul(h / 2)?.checked_mul(2)?;
        plane.checked_add(chroma)
    } else {
        Some(plane)
    }
}

/// Validates caller supplied dimensions for `format` and returns them as
/// unsigned values.
///
/// Rejects non-positive sizes, odd sizes for 4:2:0 formats, unknown formats
/// and geometries whose byte size overflows.
pub fn frame_dimensions(width: i32, height: i32, format: FourCC) -> Result<(u32, u32), Error> {
    if width <= 0 || height <= 0 {
        return Err(FormatError::NonPositiveDimensions {
            width: width.into(),
            height: height.into(),
        }
        .into());
    }
    validate_dimensions(width as u32, height as u32, format)?;
    Ok((width as u32, height as u32))
}

/// Unsigned counterpart of [`frame_dimensions`], returning the byte size.
fn validate_dimensions(width: u32, height: u32, format: FourCC) -> Result<usize, Error> {
    if width == 0 || height == 0 {
        return Err(FormatError::NonPositiveDimensions {
            width: width.into(),
            height: height.into(),
        }
        .into());
    }
    if format_row_stride(format, 0).is_none() {
        return Err(FormatError::UnsupportedFormat(format).into());
    }
    if is_yuv420(format) && (width % 2 != 0 || height % 2 != 0) {
        return Err(FormatError::OddDimensions { width, height }.into());
    }
    Ok(image_size(width, height, format).ok_or(FormatError::TooLarge { width, height })?)
}

/// Checks `len` against the expected size of a `width` x `height` frame.
///
/// The RGBA output of the same geometry must be addressable too, so an
/// input that could never be fully processed is rejected up front.
pub fn check_frame_size(
    len: usize,
    width: i32,
    height: i32,
    format: FourCC,
) -> Result<(u32, u32), Error> {
    let (width, height) = frame_dimensions(width, height, format)?;
    if image_size(width, height, RGBA).is_none() {
        return Err(FormatError::TooLarge { width, height }.into());
    }
    check_len(len, width, height, format)?;
    Ok((width, height))
}

fn check_len(len: usize, width: u32, height: u32, format: FourCC) -> Result<(), Error> {
    let expected = validate_dimensions(width, height, format)?;
    if len != expected {
        return Err(FormatError::SizeMismatch {
            expected,
            actual: len,
        }
        .into());
    }
    Ok(())
}

/// Allocates a zero-filled buffer, reporting allocation failure against
/// `stage` instead of aborting.
pub(crate) fn alloc_buffer<T: Copy>(
    len: usize,
    fill: T,
    stage: Option<Stage>,
) -> Result<Vec<T>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| Error::ProcessingFailure { stage, source })?;
    buf.resize(len, fill);
    Ok(buf)
}

/// Heap-backed image buffer.
///
/// `Image` owns its pixel data and always holds exactly
/// [`image_size`] bytes for its geometry and format.
///
/// # Example
///
/// ```
/// use edgefirst_edges::image::{Image, NV21};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(640, 480, NV21)?;
/// assert_eq!(img.width(), 640);
/// assert_eq!(img.height(), 480);
/// assert_eq!(img.size(), 640 * 480 * 3 / 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: FourCC,
}

impl Image {
    /// Allocates a new zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrameFormat`] for invalid dimensions or an
    /// unknown format, and [`Error::ProcessingFailure`] if the buffer cannot
    /// be allocated.
    pub fn new(width: u32, height: u32, format: FourCC) -> Result<Self, Error> {
        Self::allocate(width, height, format, None)
    }

    /// Allocates the output of a pipeline stage.
    pub(crate) fn alloc(
        width: u32,
        height: u32,
        format: FourCC,
        stage: Stage,
    ) -> Result<Self, Error> {
        Self::allocate(width, height, format, Some(stage))
    }

    fn allocate(
        width: u32,
        height: u32,
        format: FourCC,
        stage: Option<Stage>,
    ) -> Result<Self, Error> {
        let size = validate_dimensions(width, height, format)?;
        Ok(Self {
            data: alloc_buffer(size, 0u8, stage)?,
            width,
            height,
            format,
        })
    }

    /// Wraps an existing buffer, validating its length against the geometry.
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32, format: FourCC) -> Result<Self, Error> {
        check_len(data.len(), width, height, format)?;
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Fails with `UnsupportedFormat` unless the image has `format`.
    pub(crate) fn expect_format(&self, format: FourCC) -> Result<(), Error> {
        if self.format != format {
            return Err(FormatError::UnsupportedFormat(self.format).into());
        }
        Ok(())
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} size:{}",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Encodes an RGBA image to JPEG format using turbojpeg.
///
/// # Errors
///
/// Returns an error if the image is not RGBA or compression fails.
///
/// # Example
///
/// ```no_run
/// use edgefirst_edges::image::{encode_jpeg, Image, RGBA};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(640, 480, RGBA)?;
/// let jpeg = encode_jpeg(&img, 90)?;
/// println!("Compressed to {} bytes", jpeg.len());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "jpeg")]
pub fn encode_jpeg(
    img: &Image,
    quality: i32,
) -> Result<turbojpeg::OwnedBuf, Box<dyn std::error::Error + Send + Sync>> {
    img.expect_format(RGBA)?;
    let src = turbojpeg::Image {
        width: img.width() as usize,
        height: img.height() as usize,
        format: turbojpeg::PixelFormat::RGBA,
        pixels: img.as_slice(),
        pitch: img.width() as usize * 4,
    };
    Ok(turbojpeg::compress(src, quality, turbojpeg::Subsamp::Sub2x2)?)
}
