use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lzw_huffman::{CompressionMethod, Compressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_text(len: usize) -> Vec<u8> {
    let words = ["it", "was", "the", "best", "of", "times", "worst", "age", "wisdom"];
    let mut rng = StdRng::seed_from_u64(1859);
    let mut out = Vec::with_capacity(len + 8);
    while out.len() < len {
        out.extend_from_slice(words[rng.gen_range(0..words.len())].as_bytes());
        out.push(b' ');
    }
    out.truncate(len);
    out
}

fn bench_compress(c: &mut Criterion) {
    let compressor = Compressor::default();
    let data = sample_text(64 * 1024);
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for method in CompressionMethod::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(method), &data, |b, data| {
            b.iter(|| compressor.compress(black_box(data), method).unwrap())
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let compressor = Compressor::default();
    let data = sample_text(64 * 1024);
    let mut group = c.benchmark_group("decompress");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for method in CompressionMethod::ALL {
        let compressed = compressor.compress(&data, method).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(method), &compressed, |b, compressed| {
            b.iter(|| compressor.decompress(black_box(compressed)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
