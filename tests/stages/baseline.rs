//! Tests for the sliding-window baseline.

use crate::test_helpers::{synthetic_cv, BASELINE_INTERCEPT, BASELINE_SLOPE};
use approx::assert_relative_eq;
use cvfit_rs::baseline::{BASELINE_START_INDEX, BASELINE_WINDOW_VOLTS};
use cvfit_rs::{BaselineFitter, CvFitError, ScaleFactor, TimeRange, TimeSeriesRecord};

fn scaled_cv() -> TimeSeriesRecord {
    let mut record = synthetic_cv(0.0, 1);
    ScaleFactor::MICRO.apply(&mut record);
    record
}

#[test]
fn test_automatic_baseline_recovers_background() {
    let record = scaled_cv();
    let width = record.samples_for(BASELINE_WINDOW_VOLTS).unwrap();
    assert_eq!(width, 40);

    let baseline = BaselineFitter::new(&record)
        .fit(BASELINE_START_INDEX, width, 300)
        .unwrap();

    assert_eq!(baseline.fitted_range.len(), width);
    assert!(baseline.fitted_range.start >= BASELINE_START_INDEX);
    assert!(baseline.fitted_range.end < 300);
    assert_relative_eq!(baseline.slope, BASELINE_SLOPE, max_relative = 0.01);
    assert_relative_eq!(baseline.intercept, BASELINE_INTERCEPT, epsilon = 1e-3);
    assert!(baseline.r_squared.unwrap() > 0.99);
}

#[test]
fn test_window_wider_than_search_span() {
    let record = scaled_cv();
    let fitter = BaselineFitter::new(&record);

    assert!(matches!(
        fitter.fit(BASELINE_START_INDEX, 40, 30),
        Err(CvFitError::InsufficientData(_))
    ));
    assert!(fitter.fit(BASELINE_START_INDEX, 1, 300).is_err());

    // Exactly one window fits
    let baseline = fitter.fit(1, 40, 41).unwrap();
    assert_eq!(baseline.fitted_range.start, 1);
    assert_eq!(baseline.fitted_range.end, 41);
}

#[test]
fn test_manual_baseline_snaps_to_samples() {
    let record = scaled_cv();
    let range = TimeRange::new(0.1, 0.5).unwrap();
    let baseline = BaselineFitter::new(&record).fit_range(&range).unwrap();

    assert_eq!(baseline.fitted_range.start, 10);
    assert_eq!(baseline.fitted_range.end, 50);
    assert_relative_eq!(baseline.fitted_range.t_start, 0.1, epsilon = 1e-9);
    assert_relative_eq!(baseline.slope, BASELINE_SLOPE, max_relative = 0.01);
    assert_relative_eq!(baseline.value_at(2.0), 0.22, epsilon = 1e-3);
}

#[test]
fn test_manual_baseline_rejects_inverted_range() {
    assert!(matches!(
        TimeRange::new(0.5, 0.1),
        Err(CvFitError::InvalidRange { .. })
    ));
}
