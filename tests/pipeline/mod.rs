//! End-to-end tests of the analysis pipeline
//!
//! These tests run [`cvfit_rs::analyze`] on synthetic voltammograms and on
//! template CSV input, and check the report and serialized output.

// Automatic ranges on clean and noisy sweeps
pub mod synthetic;

// Manual ranges, model selection and rejected configurations
pub mod manual_ranges;

// Template CSV input and the text summary
pub mod template_csv;
