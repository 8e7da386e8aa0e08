//! Performance benchmarks for matrix construction and analysis
//!
//! Synthetic chambers with a few voting blocs, sized like real legislatures.

use caucus::analysis::{AnalysisOptions, VoteMatrix, analyze, kmeans_clustering, project_2d};
use caucus::types::{VotePosition, VoteRecord};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// `legislators` members in four blocs, each voting with its bloc 85% of the time.
fn chamber(legislators: usize, bills: usize) -> Vec<VoteRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut records = Vec::with_capacity(legislators * bills);
    for member in 0..legislators {
        let bloc = member % 4;
        for bill in 0..bills {
            let bloc_line = (bill + bloc) % 3 != 0;
            let loyal = rng.random_bool(0.85);
            let position = match (bloc_line == loyal, rng.random_bool(0.05)) {
                (_, true) => VotePosition::Abstain,
                (true, false) => VotePosition::Agree,
                (false, false) => VotePosition::Disagree,
            };
            records.push(VoteRecord::new(
                format!("M{member}"),
                format!("B{bill}"),
                position,
            ));
        }
    }
    records
}

fn bench_matrix_build(c: &mut Criterion) {
    let records = chamber(300, 400);
    c.bench_function("build_matrix_300x400", |b| {
        b.iter(|| black_box(VoteMatrix::from_records(black_box(&records))));
    });
}

fn bench_stages(c: &mut Criterion) {
    let matrix = VoteMatrix::from_records(&chamber(300, 400));
    let options = AnalysisOptions::default();

    c.bench_function("project_2d_300x400", |b| {
        b.iter(|| black_box(project_2d(&matrix, &options.pca).unwrap()));
    });

    c.bench_function("kmeans_300x400", |b| {
        b.iter(|| black_box(kmeans_clustering(&matrix, &options.kmeans).unwrap()));
    });
}

fn bench_analyze_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    group.sample_size(20);
    for legislators in [50, 150, 450] {
        let matrix = VoteMatrix::from_records(&chamber(legislators, 200));
        group.bench_with_input(
            BenchmarkId::from_parameter(legislators),
            &matrix,
            |b, matrix| {
                b.iter(|| black_box(analyze(matrix, &AnalysisOptions::default()).unwrap()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_matrix_build, bench_stages, bench_analyze_scaling);
criterion_main!(benches);
