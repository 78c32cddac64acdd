//! Ensemble training and prediction benchmarks on synthetic survey data.
//!
//! Run with: `cargo bench --bench ensemble`

use std::time::Duration;

use obesity_ensemble::data::N_CLASSES;
use obesity_ensemble::testing::synthetic_records;
use obesity_ensemble::{
    Classifier, FeatureTransformer, MemberConfig, Parallelism, SoftVotingEnsemble, Verbosity,
};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn bench_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(10))
        .sample_size(10)
}

fn prepared(rows: usize) -> (ndarray::Array2<f32>, Vec<u32>) {
    let records = synthetic_records(rows, 42);
    let features = FeatureTransformer::new()
        .fit_transform(&records)
        .expect("synthetic records transform")
        .into_values();
    let labels = FeatureTransformer::labels(&records).expect("synthetic records are labeled");
    (features, labels)
}

fn bench_member_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble/train/member");
    let (features, labels) = prepared(2_000);
    group.throughput(Throughput::Elements(labels.len() as u64));

    for member in MemberConfig::reference_members() {
        for (mode, parallelism) in [("seq", Parallelism::Sequential), ("par", Parallelism::Parallel)] {
            group.bench_function(BenchmarkId::new(member.name.as_str(), mode), |b| {
                b.iter(|| {
                    black_box(
                        member
                            .spec
                            .fit(black_box(features.view()), &labels, N_CLASSES, Verbosity::Silent, parallelism)
                            .unwrap(),
                    )
                })
            });
        }
    }
    group.finish();
}

fn bench_ensemble_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble/predict");
    let (train_x, train_y) = prepared(2_000);
    let ensemble = SoftVotingEnsemble::fit(
        &MemberConfig::reference_members(),
        train_x.view(),
        &train_y,
        N_CLASSES,
        Verbosity::Silent,
        Parallelism::Parallel,
    )
    .unwrap();

    for rows in [100usize, 1_000, 10_000] {
        let (features, _) = prepared(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("predict_proba", rows), &features, |b, x| {
            b.iter(|| black_box(ensemble.predict_proba(black_box(x.view()))))
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = bench_criterion();
    targets = bench_member_training, bench_ensemble_predict
}
criterion_main!(benches);
