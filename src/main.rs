// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use clap::Parser;
use edgefirst_edges::{
    image::{frame_dimensions, image_size, Image},
    FrameEdgeProcessor, ProcessStats, Stage,
};
use serde_json::{json, Value};
use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod args;

type BoxError = Box<dyn Error + Send + Sync>;

/// A processed frame on its way to the writer thread.
struct Processed {
    index: usize,
    image: Image,
    stats: ProcessStats,
    fps: i64,
}

fn update_fps(prev: &mut Instant, history: &mut [i64], index: &mut usize) -> i64 {
    let now = Instant::now();

    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1e9 as i64 / (elapsed.as_nanos() as i64).max(1);
    *index = (*index + 1) % history.len();

    (history.iter().sum::<i64>() as f64 / history.len() as f64).round() as i64
}

/// Installs stdout, journald and (optionally) Tracy layers. The returned
/// client handle keeps the profiler alive for the life of the process.
fn init_tracing(args: &Args) -> Option<tracy_client::Client> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(level);
    let journald = tracing_journald::layer()
        .ok()
        .map(|layer| layer.with_filter(level));

    let client = args.tracy.then(tracy_client::Client::start);
    let tracy = args
        .tracy
        .then(|| tracing_tracy::TracyLayer::default().with_filter(level));

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(journald)
        .with(tracy)
        .init();

    client
}

/// Output path for frame `index`. A single frame goes to `output` as is,
/// otherwise the index is appended to the file stem.
fn frame_path(output: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}_{index:04}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index:04}"),
    };
    output.with_file_name(name)
}

fn stats_json(frame: &Processed, write_time: Duration) -> Value {
    let ms = |d: Duration| d.as_secs_f64() * 1000.0;
    let stages: serde_json::Map<String, Value> = Stage::ALL
        .iter()
        .map(|s| (s.name().to_string(), json!(ms(frame.stats.stage(*s)))))
        .collect();
    json!({
        "frame": frame.index,
        "resolution": {
            "width": frame.stats.width,
            "height": frame.stats.height,
        },
        "fps": frame.fps,
        "processing_ms": ms(frame.stats.total),
        "stages_ms": stages,
        "write_ms": ms(write_time),
        "edge_pixels": frame.stats.edge_pixels,
    })
}

#[cfg(feature = "jpeg")]
fn write_jpeg(frame: &Processed, args: &Args, total: usize) -> Result<usize, BoxError> {
    let jpeg = edgefirst_edges::image::encode_jpeg(&frame.image, args.jpeg_quality)?;
    let path = frame_path(&args.output, frame.index, total);
    std::fs::write(&path, &*jpeg)?;
    Ok(jpeg.len())
}

#[cfg(not(feature = "jpeg"))]
fn write_jpeg(_frame: &Processed, _args: &Args, _total: usize) -> Result<usize, BoxError> {
    Err("built without JPEG support".into())
}

// Encoding lives in its own thread since it can be significantly slower
// than processing.
fn write_frames(rx: kanal::Receiver<Processed>, args: &Args, total: usize) -> Result<(), BoxError> {
    let mut raw = if args.jpeg {
        None
    } else {
        Some(BufWriter::new(File::create(&args.output)?))
    };

    while let Ok(frame) = rx.recv() {
        let now = Instant::now();
        let bytes = match raw.as_mut() {
            Some(out) => {
                out.write_all(frame.image.as_slice())?;
                frame.image.size()
            }
            None => write_jpeg(&frame, args, total)?,
        };
        let write_time = now.elapsed();

        debug!(
            "frame {} {} written: {}KB in {:?}",
            frame.index,
            frame.image,
            bytes / 1024,
            write_time
        );
        if args.stats {
            println!("{}", stats_json(&frame, write_time));
        }
    }

    if let Some(mut out) = raw {
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    let _tracy = init_tracing(&args);

    if cfg!(not(feature = "jpeg")) && args.jpeg {
        return Err("built without JPEG support".into());
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let processor = FrameEdgeProcessor::with_format(args.format.into())?;
    let (width, height) = frame_dimensions(args.width(), args.height(), processor.format())?;
    let frame_len = image_size(width, height, processor.format()).ok_or("frame size overflow")?;

    let input = std::fs::read(&args.input)?;
    let available = input.len() / frame_len;
    if available == 0 {
        return Err(format!(
            "{} holds {} bytes but one {}x{} {} frame needs {}",
            args.input.display(),
            input.len(),
            width,
            height,
            processor.format(),
            frame_len
        )
        .into());
    }
    if input.len() % frame_len != 0 {
        warn!(
            "ignoring {} trailing bytes after {} frames",
            input.len() % frame_len,
            available
        );
    }
    let total = args.frames.map_or(available, |n| n.min(available));
    info!(
        "processing {} of {} frames {}x{} {} from {}",
        total,
        available,
        width,
        height,
        processor.format(),
        args.input.display()
    );

    let (tx, rx) = kanal::bounded(args.queue_depth);
    let writer_args = args.clone();
    let writer = thread::spawn(move || write_frames(rx, &writer_args, total));

    let mut prev = Instant::now();
    let mut history = vec![0; 30];
    let mut fps_index = 0;
    for (index, frame) in input.chunks_exact(frame_len).take(total).enumerate() {
        let (image, stats) = processor.process_with_stats(frame, args.width(), args.height())?;
        let fps = update_fps(&mut prev, &mut history, &mut fps_index);
        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }

        debug!("frame {index} processed in {:?} fps: {fps}", stats.total);

        if tx
            .send(Processed {
                index,
                image,
                stats,
                fps,
            })
            .is_err()
        {
            // writer exited, its error is reported below
            break;
        }
    }
    drop(tx);

    match writer.join() {
        Ok(res) => res?,
        Err(_) => return Err("writer thread panicked".into()),
    }

    info!("wrote {} frames to {}", total, args.output.display());
    Ok(())
}
