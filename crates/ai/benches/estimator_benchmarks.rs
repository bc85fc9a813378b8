use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use forgeml_ai::{Arima, ForestParams, KMeans, KMeansParams, RandomForestRegressor, Regressor};

/// Deterministic pseudo-random design matrix (no RNG dependency in the hot loop).
fn design(n: usize, width: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..width)
                .map(|j| (((i * 31 + j * 17) % 97) as f64) / 9.7)
                .collect()
        })
        .collect();
    let y = x
        .iter()
        .map(|r| r.iter().enumerate().map(|(j, v)| v * (j + 1) as f64).sum())
        .collect();
    (x, y)
}

fn demand_series(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            120.0 + 25.0 * (t / 58.0).sin() + 15.0 * ((t * 1.3).sin() * 0.3) + (i % 7) as f64
        })
        .collect()
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest");
    group.sample_size(10);

    for &n in &[100usize, 400] {
        let (x, y) = design(n, 11);
        let params = ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        };
        group.bench_with_input(BenchmarkId::new("fit", n), &n, |b, _| {
            b.iter(|| RandomForestRegressor::fit(black_box(&x), black_box(&y), params))
        });

        let forest = RandomForestRegressor::fit(&x, &y, params).expect("fit");
        group.bench_with_input(BenchmarkId::new("predict_each", n), &n, |b, _| {
            b.iter(|| forest.predict_each(black_box(&x[0])))
        });
        group.bench_with_input(BenchmarkId::new("predict", n), &n, |b, _| {
            b.iter(|| forest.predict_row(black_box(&x[0])))
        });
    }

    group.finish();
}

fn bench_kmeans(c: &mut Criterion) {
    let (x, _) = design(300, 6);
    c.bench_function("kmeans_fit_300x6", |b| {
        b.iter(|| KMeans::fit(black_box(&x), KMeansParams::default()))
    });
}

fn bench_arima(c: &mut Criterion) {
    let mut group = c.benchmark_group("arima");
    group.sample_size(10);

    for &n in &[180usize, 730] {
        let series = demand_series(n);
        group.bench_with_input(BenchmarkId::new("fit", n), &series, |b, s| {
            b.iter(|| Arima::fit(black_box(s)))
        });
    }

    let model = Arima::fit(&demand_series(730)).expect("fit");
    group.bench_function("forecast_30", |b| b.iter(|| model.forecast(black_box(30))));
    group.finish();
}

criterion_group!(benches, bench_forest, bench_kmeans, bench_arima);
criterion_main!(benches);
