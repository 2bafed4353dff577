//! # cvfit-rs
//!
//! `cvfit-rs` separates the capacitive baseline from the diffusion-limited
//! Faradaic current in cyclic voltammetry traces and reports the ratio of
//! the baseline-corrected forward and backward peak currents.
//!
//! The library provides:
//! - Current autoscaling, peak detection and switch potential detection
//! - A sliding-window linear baseline search
//! - Bounded Levenberg-Marquardt fits of two piecewise diffusion models with
//!   an adaptive fitting-range search
//! - A template CSV reader and a plain-text summary report
//!
//! ## Basic Usage
//!
//! ```no_run
//! use cvfit_rs::{analyze, AnalysisConfig, DiffusionModel};
//! use cvfit_rs::io::read_template_csv;
//! use cvfit_rs::report::Summary;
//!
//! let data = read_template_csv("ferrocene.csv")?;
//! let config = AnalysisConfig::new().with_diffusion_model(DiffusionModel::SemiInfinite);
//! let analysis = analyze(data.record, &config)?;
//! println!("{}", Summary::new(&analysis).with_source("ferrocene.csv"));
//! # Ok::<(), cvfit_rs::CvFitError>(())
//! ```

// Numerical engine
pub mod bounds;
pub mod error;
pub mod lm;
pub mod problem;
mod utils;

// Voltammetry analysis
pub mod analysis;
pub mod baseline;
pub mod diffusion;
pub mod peaks;
pub mod record;
pub mod scale;
pub mod stats;
pub mod switch;

// Presentation boundary
pub mod io;
pub mod report;

// Re-exports for convenience
pub use analysis::{analyze, AnalysisConfig, CvAnalysis, PeakCurrents, RangeMode};
pub use baseline::{Baseline, BaselineFitter};
pub use diffusion::{DiffusionFitter, DiffusionModel, FitResult, ModelContext};
pub use error::{CvFitError, Result};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use peaks::{PeakLocator, PeakMarker, PeakSummary, Polarity};
pub use problem::Problem;
pub use record::{FitWindow, TimeRange, TimeSeriesRecord};
pub use scale::ScaleFactor;
pub use switch::SwitchMarker;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
