//! Manual ranges, model selection and rejected configurations.

use crate::test_helpers::{expected_ratio, synthetic_cv, BASELINE_SLOPE, K};
use approx::assert_relative_eq;
use cvfit_rs::{analyze, AnalysisConfig, CvFitError, DiffusionModel, RangeMode, TimeSeriesRecord};
use ndarray::Array1;

#[test]
fn test_manual_baseline_and_fit_range() {
    let config = AnalysisConfig::new()
        .with_manual_baseline(0.1, 0.5)
        .with_manual_fit_range(4.0, 9.0);
    let analysis = analyze(synthetic_cv(0.0, 1), &config).unwrap();

    assert_eq!(analysis.baseline_mode, RangeMode::Manual { start: 0.1, end: 0.5 });
    assert_eq!(analysis.baseline.fitted_range.start, 10);
    assert_eq!(analysis.baseline.fitted_range.end, 50);
    assert_relative_eq!(analysis.baseline.slope, BASELINE_SLOPE, max_relative = 0.01);

    assert_eq!(analysis.fit.fitted_range.start, 400);
    assert_eq!(analysis.fit.fitted_range.end, 900);
    assert_relative_eq!(analysis.fit.k(), K, max_relative = 0.01);
    assert_relative_eq!(analysis.currents.ratio, expected_ratio(), max_relative = 0.01);
}

#[test]
fn test_finite_diffusion_model() {
    let config = AnalysisConfig::new().with_diffusion_model(DiffusionModel::FiniteWithCorrection);
    let analysis = analyze(synthetic_cv(1e-5, 5), &config).unwrap();

    let fit = &analysis.fit;
    assert_eq!(fit.model, DiffusionModel::FiniteWithCorrection);
    assert_eq!(fit.params.len(), 3);
    assert!(fit.a().unwrap().abs() < 0.05);
    assert_relative_eq!(fit.k(), K, max_relative = 0.05);
    assert!(fit.r_squared > 0.98);
    assert_relative_eq!(analysis.currents.ratio, expected_ratio(), max_relative = 0.01);
}

#[test]
fn test_initial_guess_override() {
    let config = AnalysisConfig::new().with_initial_guess(vec![2.0, 1.0]);
    let analysis = analyze(synthetic_cv(0.0, 1), &config).unwrap();
    assert_relative_eq!(analysis.fit.k(), K, max_relative = 0.05);

    // Outside the t' bounds, which end at the first peak time
    let config = AnalysisConfig::new().with_initial_guess(vec![2.0, 3.5]);
    assert!(matches!(
        analyze(synthetic_cv(0.0, 1), &config),
        Err(CvFitError::Fitting(_))
    ));
}

#[test]
fn test_invalid_range_rejected_before_fitting() {
    // A record without peaks: range validation must fail first
    let n = 100;
    let potential = Array1::linspace(0.0, 0.1, n);
    let current = Array1::from_elem(n, 1e-6);
    let record = TimeSeriesRecord::with_uniform_time(potential, current, 0.01).unwrap();

    for config in [
        AnalysisConfig::new().with_manual_fit_range(8.0, 4.0),
        AnalysisConfig::new().with_manual_baseline(-1.0, 0.5),
        AnalysisConfig::new().with_manual_fit_range(2.0, 2.0),
    ] {
        assert!(matches!(
            analyze(record.clone(), &config),
            Err(CvFitError::InvalidRange { .. })
        ));
    }

    assert!(matches!(
        analyze(record, &AnalysisConfig::new()),
        Err(CvFitError::NoPeak(_))
    ));
}

#[test]
fn test_manual_window_collapsing_to_one_sample() {
    let config = AnalysisConfig::new().with_manual_fit_range(4.0, 4.001);
    assert!(matches!(
        analyze(synthetic_cv(0.0, 1), &config),
        Err(CvFitError::InsufficientData(_))
    ));
}
