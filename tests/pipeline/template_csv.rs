//! Template CSV input and the plain-text summary.

use crate::test_helpers::{expected_ratio, synthetic_cv};
use approx::assert_relative_eq;
use cvfit_rs::io::{parse_template_csv, read_template_csv};
use cvfit_rs::report::Summary;
use cvfit_rs::{analyze, AnalysisConfig, CvFitError, DiffusionModel};
use std::fs;

fn template_text() -> String {
    let record = synthetic_cv(0.0, 1);
    let mut text = String::from("Scan rate,0.1\nE (V),I (A)\n");
    for (e, i) in record.potential().iter().zip(record.current().iter()) {
        text.push_str(&format!("{},{}\n", e, i));
    }
    text.push_str(",\n");
    text
}

#[test]
fn test_parse_rebuilds_time_axis() {
    let data = parse_template_csv(&template_text()).unwrap();

    assert_relative_eq!(data.scan_rate, 0.1);
    assert_relative_eq!(data.v_per_index, 0.001);
    assert_eq!(data.record.len(), 2000);
    assert_relative_eq!(data.record.time()[1000], 10.0, epsilon = 1e-9);
    assert_relative_eq!(data.record.current()[300], synthetic_cv(0.0, 1).current()[300]);
}

#[test]
fn test_file_to_summary() {
    let path = std::env::temp_dir().join(format!("cvfit_template_{}.csv", std::process::id()));
    fs::write(&path, template_text()).unwrap();
    let data = read_template_csv(&path);
    fs::remove_file(&path).unwrap();

    let analysis = analyze(data.unwrap().record, &AnalysisConfig::new()).unwrap();
    assert_eq!(analysis.peaks.first.index, 300);
    assert_eq!(analysis.peaks.second.index, 1700);
    assert_relative_eq!(analysis.currents.ratio, expected_ratio(), max_relative = 0.01);

    let report = Summary::new(&analysis).with_source("synthetic.csv").to_string();
    assert!(report.starts_with("DIFFUSIONAL FITTER SUMMARY\nFile: synthetic.csv\n"));
    assert!(report.contains("peak ratio: 1.039"));
    assert!(report.contains("LINEAR FIT (Forward peak baseline)"));
    assert!(report.contains("Fitting range selection: automatic"));
    assert!(report.contains("slope: "));
    assert!(report.contains(" uA / s"));
    assert!(report.contains("SEMI-INFINITE DIFFUSION FIT (Backpeak baseline)"));
    assert!(report.contains("Fitting function: k/sqrt(t-t') + "));
    assert!(report.contains(" uC / s^(1/2)"));
    assert!(!report.contains("a = "));
    assert!(report.trim_end().lines().last().unwrap().starts_with("R-squared: "));
}

#[test]
fn test_finite_model_summary() {
    let data = parse_template_csv(&template_text()).unwrap();
    let config = AnalysisConfig::new()
        .with_diffusion_model(DiffusionModel::FiniteWithCorrection)
        .with_manual_fit_range(4.0, 9.0);
    let analysis = analyze(data.record, &config).unwrap();

    let report = Summary::new(&analysis).to_string();
    assert!(!report.contains("File:"));
    assert!(report.contains("FINITE DIFFUSION FIT (Backpeak baseline)"));
    assert!(report.contains("Fitting range selection: manual"));
    assert!(report.contains("0.2732 * a * exp[(-0.9961 * |a|) / sqrt(t-t')]"));
    assert!(report.contains("a = "));
}

#[test]
fn test_config_file() {
    let path = std::env::temp_dir().join(format!("cvfit_config_{}.json", std::process::id()));
    let config = AnalysisConfig::new()
        .with_diffusion_model(DiffusionModel::FiniteWithCorrection)
        .with_manual_baseline(0.1, 0.5);
    fs::write(&path, config.to_json().unwrap()).unwrap();
    let loaded = AnalysisConfig::from_file(&path);
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap(), config);
}

#[test]
fn test_malformed_template() {
    let mut text = template_text();
    text.insert_str(text.find("0.005,").unwrap(), "0.0045,not-a-number\n");

    match parse_template_csv(&text) {
        Err(CvFitError::Parse { line, .. }) => assert_eq!(line, 8),
        other => panic!("expected a parse error, got {:?}", other.map(|d| d.scan_rate)),
    }

    assert!(matches!(
        read_template_csv("/nonexistent/cvfit/template.csv"),
        Err(CvFitError::Io(_))
    ));
}
