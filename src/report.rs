//! Plain-text summary of an analysis.

use crate::analysis::CvAnalysis;
use crate::diffusion::DiffusionModel;
use std::fmt;

/// Text report for one [`CvAnalysis`], written with ASCII unit prefixes.
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a> {
    analysis: &'a CvAnalysis,
    source: Option<&'a str>,
}

impl<'a> Summary<'a> {
    pub fn new(analysis: &'a CvAnalysis) -> Self {
        Self {
            analysis,
            source: None,
        }
    }

    /// Name of the data file shown in the header.
    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        let unit = analysis.scale.report_prefix;
        let baseline = &analysis.baseline;
        let fit = &analysis.fit;
        let currents = &analysis.currents;

        writeln!(f, "DIFFUSIONAL FITTER SUMMARY")?;
        if let Some(source) = self.source {
            writeln!(f, "File: {}", source)?;
        }
        writeln!(
            f,
            "Delta Ep: {} V, Ip1: {} {}A, Ip2: {} {}A, peak ratio: {:.4}",
            analysis.delta_ep, currents.ip1, unit, currents.ip2, unit, currents.ratio
        )?;
        writeln!(f)?;

        writeln!(f, "LINEAR FIT (Forward peak baseline)")?;
        writeln!(f, "Fitting range selection: {}", analysis.baseline_mode.label())?;
        writeln!(
            f,
            "Linear fit range: {} - {} s",
            baseline.fitted_range.t_start, baseline.fitted_range.t_end
        )?;
        writeln!(f, "Fitting function: slope*t + intercept")?;
        writeln!(f, "slope: {} {}A / s", baseline.slope, unit)?;
        writeln!(f, "intercept: {} {}A", baseline.intercept, unit)?;
        match baseline.r_squared {
            Some(r_squared) => writeln!(f, "R-squared: {}", r_squared)?,
            None => writeln!(f, "R-squared: undefined")?,
        }
        writeln!(f)?;

        writeln!(f, "{} FIT (Backpeak baseline)", fit.model.name().to_uppercase())?;
        writeln!(f, "Fitting range selection: {}", analysis.fit_range_mode.label())?;
        writeln!(
            f,
            "{} fit range: {} - {} s",
            fit.model.name(),
            fit.fitted_range.t_start,
            fit.fitted_range.t_end
        )?;
        let term = match fit.model {
            DiffusionModel::SemiInfinite => "k/sqrt(t-t')",
            DiffusionModel::FiniteWithCorrection => {
                "a + k/sqrt(t-t') + 0.2732 * a * exp[(-0.9961 * |a|) / sqrt(t-t')]"
            }
        };
        writeln!(
            f,
            "Fitting function: {} + {} + {}*t",
            term, baseline.intercept, baseline.slope
        )?;
        writeln!(f, "k = {} {}C / s^(1/2)", fit.k(), unit)?;
        writeln!(f, "t' = {} s", fit.t_prime())?;
        if let Some(a) = fit.a() {
            writeln!(f, "a = {} {}A", a, unit)?;
        }
        writeln!(f, "R-squared: {}", fit.r_squared)
    }
}
