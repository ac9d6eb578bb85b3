use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_edges::FrameEdgeProcessor;

fn frame(width: usize, height: usize) -> Vec<u8> {
    let mut frame = vec![128u8; width * height * 3 / 2];
    for (i, px) in frame[..width * height].iter_mut().enumerate() {
        let (x, y) = (i % width, i / width);
        *px = if (x / 32 + y / 32) % 2 == 0 { 40 } else { 210 };
    }
    frame
}

pub fn benchmark_process(c: &mut Criterion) {
    let processor = FrameEdgeProcessor::new();
    let mut group = c.benchmark_group("process");
    for dim in [(320, 240), (640, 480), (1280, 720), (1920, 1080)].iter() {
        let src = frame(dim.0, dim.1);
        group.bench_with_input(format!("{}x{}", dim.0, dim.1), &src, |b, src| {
            b.iter(|| processor.process(src, dim.0 as i32, dim.1 as i32).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_process);
criterion_main!(benches);
