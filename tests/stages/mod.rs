//! Tests for the individual analysis stages
//!
//! Each module exercises one stage through the public API, independent of
//! the full pipeline.

// Levenberg-Marquardt solver and parameter bounds
pub mod solver;


// Sliding-window linear baseline
pub mod baseline;
