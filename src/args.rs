// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_edges::image::{FourCC, I420, NV12, NV21};
use std::path::PathBuf;

/// Raw input frame layouts.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum InputFormat {
    /// YUV 4:2:0 semi-planar, V before U (Android camera)
    Nv21,
    /// YUV 4:2:0 semi-planar, U before V
    Nv12,
    /// YUV 4:2:0 planar, U plane then V plane
    I420,
}

impl From<InputFormat> for FourCC {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Nv21 => NV21,
            InputFormat::Nv12 => NV12,
            InputFormat::I420 => I420,
        }
    }
}

/// Command-line arguments for the EdgeFirst edge detector.
///
/// Reads one or more concatenated raw frames from a file, runs the edge
/// pipeline on each and writes RGBA or JPEG results. Arguments can be
/// specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Process a 640x480 NV21 capture into one JPEG per frame
/// edgefirst-edges capture.nv21 --jpeg --output edges.jpeg
///
/// # Via environment variables
/// export FRAME_SIZE="1280 720"
/// export FORMAT=nv12
/// edgefirst-edges capture.nv12 --stats
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw YUV 4:2:0 input file holding one or more concatenated frames
    #[arg(env = "INPUT")]
    pub input: PathBuf,

    /// Frame resolution in pixels (width height)
    #[arg(
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<i32>,

    /// Input frame layout
    #[arg(long, env = "FORMAT", default_value = "nv21", value_enum)]
    pub format: InputFormat,

    /// Output path; raw RGBA frames are concatenated, JPEG frames get a
    /// numbered file each when more than one frame is processed
    #[arg(short, long, env = "OUTPUT", default_value = "edges.rgba")]
    pub output: PathBuf,

    /// Encode output frames as JPEG instead of raw RGBA
    #[arg(long, env = "JPEG")]
    pub jpeg: bool,

    /// JPEG quality (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value = "90", value_parser = clap::value_parser!(i32).range(1..=100))]
    pub jpeg_quality: i32,

    /// Maximum number of frames to process (default: all frames in the input)
    #[arg(long, env = "FRAMES")]
    pub frames: Option<usize>,

    /// Number of processed frames buffered for the writer thread
    #[arg(long, env = "QUEUE_DEPTH", default_value = "4")]
    pub queue_depth: usize,

    /// Worker threads for the row-parallel stages (default: one per core)
    #[arg(long, env = "THREADS")]
    pub threads: Option<usize>,

    /// Print one JSON line of frame statistics per processed frame
    #[arg(long, env = "STATS")]
    pub stats: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn width(&self) -> i32 {
        self.size[0]
    }

    pub fn height(&self) -> i32 {
        self.size[1]
    }
}
