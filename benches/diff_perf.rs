// benches/diff_perf.rs
// Criterion benchmarks for the alignment engine and the 2D aligner.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use seqdiff::{
    diff, diff_aligned_2d, similarity_ratio, DiffOptions, MatrixDiffOptions, MatrixRef,
};

/// A long sequence containing the short one as its middle third: the
/// worst-ish case for the bidirectional search, all cost spent on the
/// flanks.
fn long_short(n: usize) -> (Vec<u64>, Vec<u64>) {
    let long: Vec<u64> = std::iter::repeat(0)
        .take(n)
        .chain(std::iter::repeat(2).take(n))
        .chain(std::iter::repeat(0).take(n))
        .collect();
    let short: Vec<u64> = std::iter::repeat(2).take(n).collect();
    (long, short)
}

fn random_edit_pair(rng: &mut StdRng, len: usize, edits: usize) -> (Vec<u64>, Vec<u64>) {
    let a: Vec<u64> = (0..len).map(|_| rng.gen_range(0..32)).collect();
    let mut b = a.clone();
    for _ in 0..edits {
        let at = rng.gen_range(0..b.len());
        match rng.gen_range(0..3) {
            0 => b[at] = 1000 + rng.gen_range(0..32),
            1 => {
                b.remove(at);
            }
            _ => b.insert(at, 2000 + rng.gen_range(0..32)),
        }
    }
    (a, b)
}

fn bench_long_short(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_short");
    let opts = DiffOptions::default();
    for n in [256usize, 512, 1024] {
        let (long, short) = long_short(n);
        group.throughput(Throughput::Elements((long.len() + short.len()) as u64));
        group.bench_with_input(BenchmarkId::new("script", n), &n, |bencher, _| {
            bencher.iter(|| diff(black_box(&long), black_box(&short), &opts).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("ratio_only", n), &n, |bencher, _| {
            bencher.iter(|| similarity_ratio(black_box(&long), black_box(&short), &opts));
        });
    }
    group.finish();
}

fn bench_sparse_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_edits");
    let opts = DiffOptions::default();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);
    for len in [1024usize, 4096] {
        let (a, b) = random_edit_pair(&mut rng, len, 16);
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));
        group.bench_with_input(BenchmarkId::new("script", len), &len, |bencher, _| {
            bencher.iter(|| diff(black_box(&a), black_box(&b), &opts).unwrap());
        });
    }
    group.finish();
}

fn bench_aligned_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("aligned_2d");
    let mut rng = StdRng::seed_from_u64(7);
    for rows in [32usize, 128] {
        let cols = 16;
        let a_data: Vec<i64> = (0..rows * cols).map(|_| rng.gen_range(0..100)).collect();
        let mut b_data = a_data.clone();
        // perturb a few cells and drop one row
        for _ in 0..rows / 4 {
            let at = rng.gen_range(0..b_data.len());
            b_data[at] = -7;
        }
        b_data.drain(cols * 3..cols * 4);

        let a = MatrixRef::new(&a_data, rows, cols).unwrap();
        let b = MatrixRef::new(&b_data, rows - 1, cols).unwrap();
        let opts = MatrixDiffOptions::default();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |bencher, _| {
            bencher.iter(|| diff_aligned_2d(black_box(a), black_box(b), -1, &opts).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_long_short, bench_sparse_edits, bench_aligned_2d);
criterion_main!(benches);
