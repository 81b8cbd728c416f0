//! Performance benchmarks for the serial line framer.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench line_framer_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use scanbridge_protocol::LineFramer;
use std::hint::black_box;

/// Build a stream of `count` scanner frames.
fn sample_stream(count: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..count {
        if i % 3 == 0 {
            stream.extend_from_slice(b"NO_MATCH\r\n");
        } else {
            stream.extend_from_slice(format!("VOTER: {i}\r\n").as_bytes());
        }
    }
    stream
}

/// Benchmark framing a single complete line.
fn bench_single_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_single_line");
    group.throughput(Throughput::Elements(1));

    group.bench_function("voter_line", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new();
            framer.feed(black_box(b"VOTER: 123\r\n"));
            black_box(framer.next_line());
        });
    });

    group.finish();
}

/// Benchmark framing a stream delivered in chunks of various sizes.
fn bench_chunked_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_chunked_stream");
    let stream = sample_stream(100);
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in [1usize, 8, 64, 512] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &stream,
            |b, stream| {
                b.iter(|| {
                    let mut framer = LineFramer::new();
                    for chunk in stream.chunks(chunk_size) {
                        framer.feed(chunk);
                        for line in framer.drain_lines() {
                            black_box(line);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark recovery from a runaway line without terminator.
fn bench_runaway_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_runaway_line");
    let mut stream = vec![b'x'; 16 * 1024];
    stream.extend_from_slice(b"\r\nVOTER: 1\r\n");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("discard_and_recover", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new();
            for chunk in stream.chunks(512) {
                framer.feed(black_box(chunk));
            }
            black_box(framer.next_line());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_line,
    bench_chunked_stream,
    bench_runaway_line
);

criterion_main!(benches);
