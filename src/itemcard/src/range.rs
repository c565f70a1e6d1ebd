//! Numeric range templates
//!
//! Modifier text can carry `(a-b)` templates standing for a rollable value.
//! `apply_range` collapses every template to a concrete value at a given
//! fraction, `apply_value_scalar` scales the bare numbers of an already
//! concrete line. Both render back into the surrounding text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((-?\d+(?:\.\d+)?)-(-?\d+(?:\.\d+)?)\)").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

/// Whether the line contains at least one `(a-b)` template
pub fn has_range_template(line: &str) -> bool {
    RANGE_RE.is_match(line)
}

fn decimals(text: &str) -> usize {
    text.split_once('.').map_or(0, |(_, frac)| frac.len())
}

fn round_to(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

fn format_value(value: f64, precision: usize) -> String {
    if precision == 0 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.precision$}")
    }
}

/// Expand every `(a-b)` template to `a + (b-a)*fraction`, times `scalar`
///
/// Precision follows the wider of the two endpoints, so integer ranges stay
/// integers and decimal ranges keep their decimals.
pub fn apply_range(line: &str, fraction: f64, scalar: f64) -> String {
    RANGE_RE
        .replace_all(line, |caps: &Captures| {
            let low: f64 = caps[1].parse().unwrap_or(0.0);
            let high: f64 = caps[2].parse().unwrap_or(0.0);
            let precision = decimals(&caps[1]).max(decimals(&caps[2]));
            let value = (low + (high - low) * fraction) * scalar;
            format_value(round_to(value, precision), precision)
        })
        .into_owned()
}

/// Scale every bare number in an already concrete line
///
/// Results are rounded to two decimals; whole results render as integers.
pub fn apply_value_scalar(line: &str, scalar: f64) -> String {
    if scalar == 1.0 {
        return line.to_string();
    }
    NUMBER_RE
        .replace_all(line, |caps: &Captures| {
            let value: f64 = caps[0].parse().unwrap_or(0.0);
            let scaled = round_to(value * scalar, 2);
            if scaled.fract() == 0.0 {
                format!("{}", scaled as i64)
            } else {
                format!("{scaled}")
            }
        })
        .into_owned()
}
