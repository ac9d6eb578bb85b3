// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_edges::{
    blur::gaussian_blur,
    canny::{canny, HIGH_THRESHOLD, LOW_THRESHOLD},
    convert::{edges_to_rgba, rgb_to_gray, yuv_to_rgb, EDGE},
    image,
    image::Image,
    Error, FormatError,
};
use std::error::Error as StdError;

#[test]
fn test_formats() -> Result<(), Box<dyn StdError>> {
    let mut img = Image::new(1920, 1080, image::NV21)?;

    println!("{}", img);
    assert_eq!(img.size(), 3110400);

    img = Image::new(1920, 1080, image::I420)?;
    println!("{}", img);
    assert_eq!(img.size(), 3110400);

    img = Image::new(1920, 1080, image::GREY)?;
    println!("{}", img);
    assert_eq!(img.size(), 2073600);

    img = Image::new(1920, 1080, image::RGB3)?;
    println!("{}", img);
    assert_eq!(img.size(), 6220800);

    img = Image::new(1920, 1080, image::RGBA)?;
    println!("{}", img);
    assert_eq!(img.size(), 8294400);

    Ok(())
}

#[test]
fn test_4k() -> Result<(), Box<dyn StdError>> {
    let img = Image::new(3840, 2160, image::NV12)?;
    assert_eq!(img.size(), 12441600);
    assert!(img.as_slice().iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn test_invalid_images() {
    assert!(matches!(
        Image::new(0, 1080, image::RGBA),
        Err(Error::InvalidFrameFormat(
            FormatError::NonPositiveDimensions { .. }
        ))
    ));
    assert!(matches!(
        Image::new(1921, 1080, image::NV21),
        Err(Error::InvalidFrameFormat(FormatError::OddDimensions { .. }))
    ));
    assert!(matches!(
        Image::new(64, 64, image::FourCC(*b"YUYV")),
        Err(Error::InvalidFrameFormat(FormatError::UnsupportedFormat(_)))
    ));
    assert!(matches!(
        Image::from_vec(vec![0; 10], 4, 4, image::GREY),
        Err(Error::InvalidFrameFormat(FormatError::SizeMismatch {
            expected: 16,
            actual: 10
        }))
    ));
}

/// Allocating more than the address space must surface as a processing
/// failure rather than an abort. A standalone image belongs to no stage.
#[test]
#[cfg(target_pointer_width = "64")]
fn test_allocation_failure() {
    for format in [image::GREY, image::RGBA] {
        let side = if format == image::GREY { u32::MAX - 1 } else { 1 << 30 };
        match Image::new(side, side, format) {
            Err(err @ Error::ProcessingFailure { stage: None, .. }) => {
                assert!(err.to_string().starts_with("processing failure: "), "{err}");
            }
            other => panic!("{format}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_stages() -> Result<(), Box<dyn StdError>> {
    let (w, h) = (20u32, 10u32);
    let mut data = vec![128u8; (w * h * 3 / 2) as usize];
    for y in 0..h {
        for x in 0..w {
            data[(y * w + x) as usize] = if x < 10 { 30 } else { 220 };
        }
    }
    let yuv = Image::from_vec(data, w, h, image::NV21)?;

    let rgb = yuv_to_rgb(&yuv)?;
    assert_eq!(rgb.format(), image::RGB3);
    assert_eq!(&rgb.as_slice()[..3], &[30, 30, 30]);

    let gray = rgb_to_gray(&rgb)?;
    assert_eq!(gray.format(), image::GREY);
    assert_eq!(gray.as_slice()[0], 30);
    assert_eq!(gray.as_slice()[19], 220);

    let blurred = gaussian_blur(&gray)?;
    assert_eq!(blurred.as_slice()[0], 30);
    assert!(blurred.as_slice()[9] > 30 && blurred.as_slice()[9] < 220);

    let edges = canny(&blurred)?;
    let count = edges.as_slice().iter().filter(|&&e| e == EDGE).count();
    assert_eq!(count, h as usize);

    let rgba = edges_to_rgba(&edges)?;
    assert_eq!(rgba.format(), image::RGBA);
    assert_eq!(rgba.size(), (w * h * 4) as usize);
    Ok(())
}

#[test]
fn test_thresholds_ordered() {
    assert!(LOW_THRESHOLD < HIGH_THRESHOLD);
}

#[test]
fn test_error_display() {
    let err = Error::from(FormatError::SizeMismatch {
        expected: 24,
        actual: 23,
    });
    assert_eq!(
        err.to_string(),
        "invalid frame format: expected 24 bytes but buffer holds 23"
    );
    assert!(StdError::source(&err).is_none());
}
