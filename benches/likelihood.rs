use criterion::Criterion;
use decay_lifetime::{LikelihoodModel, MeasurementSet};
use decay_lifetime_test_util::default_decay_sample;
use ndarray::Array1;
use std::hint::black_box;

pub fn bench_nll(c: &mut Criterion) {
    let (t, err) = default_decay_sample();
    let data = MeasurementSet::new(t, err).unwrap();
    let model = LikelihoodModel::new(&data);

    c.bench_function("NLL w/o background", |b| {
        b.iter(|| model.nll(black_box(0.41)));
    });
    c.bench_function("NLL w/ background", |b| {
        b.iter(|| model.nll_with_bkg(black_box(0.41), black_box(0.98)));
    });
}

pub fn bench_nll_surface(c: &mut Criterion) {
    let (t, err) = default_decay_sample();
    let data = MeasurementSet::new(t, err).unwrap();
    let prefix = data.prefix(1000).unwrap();
    let model = LikelihoodModel::new(&prefix);
    let taus = Array1::<f64>::linspace(0.36, 0.46, 20);
    let signal_fractions = Array1::<f64>::linspace(0.93, 0.999, 20);

    c.bench_function("NLL surface 20x20, 1000 measurements", |b| {
        b.iter(|| model.nll_surface(black_box(taus.view()), black_box(signal_fractions.view())));
    });
}
