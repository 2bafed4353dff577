//! Reader for the two-column template CSV export.
//!
//! ```text
//! Scan rate,0.1
//! E (V),I (A)
//! -0.2,1.3e-7
//! -0.199,1.31e-7
//! ...
//! ```
//!
//! The file carries no time column; time is rebuilt from the sweep step and
//! the scan rate.

use crate::error::{CvFitError, Result};
use crate::record::TimeSeriesRecord;
use log::debug;
use nom::{
    bytes::complete::take_till,
    character::complete::{char, space0},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser,
};
use ndarray::Array1;
use std::path::Path;

/// Contents of a template CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCsv {
    /// Scan rate (V/s)
    pub scan_rate: f64,
    /// Potential step per sample, rounded to 1 mV (V)
    pub v_per_index: f64,
    pub record: TimeSeriesRecord,
}

/// Read and parse a template CSV file.
pub fn read_template_csv<P: AsRef<Path>>(path: P) -> Result<TemplateCsv> {
    let content = std::fs::read_to_string(path.as_ref())?;
    debug!("Reading template CSV {}", path.as_ref().display());
    parse_template_csv(&content)
}

/// Parse template CSV text.
///
/// Blank rows and rows made only of empty cells are skipped.
pub fn parse_template_csv(content: &str) -> Result<TemplateCsv> {
    let mut lines = content.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

    let (line_no, first) = lines.next().ok_or_else(|| parse_error(1, "file is empty"))?;
    let scan_rate = finish(line_no, scan_rate_line(first))?;
    if !(scan_rate.is_finite() && scan_rate > 0.0) {
        return Err(parse_error(line_no, format!("scan rate must be positive, got {}", scan_rate)));
    }

    lines
        .next()
        .ok_or_else(|| parse_error(2, "missing column header"))?;

    let mut potential = Vec::new();
    let mut current = Vec::new();
    for (line_no, line) in lines {
        if is_empty_row(line) {
            continue;
        }
        let (e, i) = finish(line_no, data_row(line))?;
        potential.push(e);
        current.push(i);
    }

    // Step per sample from a provisional unit time axis
    let provisional = TimeSeriesRecord::with_uniform_time(
        Array1::from(potential.clone()),
        Array1::from(current.clone()),
        1.0,
    )?;
    let v_per_index = provisional.v_per_index()?;

    let record = TimeSeriesRecord::with_uniform_time(
        Array1::from(potential),
        Array1::from(current),
        v_per_index / scan_rate,
    )?;
    debug!(
        "Parsed {} samples at {} V/s, {} V per sample",
        record.len(),
        scan_rate,
        v_per_index
    );

    Ok(TemplateCsv {
        scan_rate,
        v_per_index,
        record,
    })
}

fn parse_error(line: usize, message: impl Into<String>) -> CvFitError {
    CvFitError::Parse {
        line,
        message: message.into(),
    }
}

fn finish<T>(line: usize, parsed: IResult<&str, T>) -> Result<T> {
    match parsed {
        Ok((rest, value)) if is_empty_row(rest) => Ok(value),
        Ok((rest, _)) => Err(parse_error(line, format!("unexpected trailing content '{}'", rest))),
        Err(err) => Err(parse_error(line, err.to_string())),
    }
}

fn is_empty_row(line: &str) -> bool {
    line.chars().all(|c| c == ',' || c.is_whitespace())
}

fn field(input: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0).parse(input)
}

/// `Scan rate,<value>`
fn scan_rate_line(input: &str) -> IResult<&str, f64> {
    preceded((take_till(|c: char| c == ','), char(',')), field).parse(input)
}

/// `<potential>,<current>`
fn data_row(input: &str) -> IResult<&str, (f64, f64)> {
    separated_pair(field, char(','), field).parse(input)
}
