//! Statistical primitives: least-squares trend slope and Pearson
//! correlation, plus the qualitative interpretations the dashboard
//! renders next to them.
//!
//! Both primitives tolerate missing values by pairwise deletion and
//! answer `None` ("undefined") instead of erroring when fewer than two
//! valid pairs remain or the computation degenerates. `None` is the
//! only undefined marker; NaN never leaks to callers.

use edustats_domain::{CorrelationBands, TrendThresholds};
use statrs::statistics::Statistics;

/// Slope of the degree-1 least-squares fit over `(year, value)` pairs.
///
/// Pairs with a missing value are dropped. Fewer than 2 valid pairs,
/// or zero variance in the years (duplicate-year degenerate input),
/// is undefined.
#[must_use]
pub fn trend_slope(pairs: &[(f64, Option<f64>)]) -> Option<f64> {
    let valid: Vec<(f64, f64)> = pairs
        .iter()
        .filter_map(|(x, y)| y.map(|y| (*x, y)))
        .collect();
    if valid.len() < 2 {
        return None;
    }

    let mean_x = valid.iter().map(|(x, _)| *x).mean();
    let mean_y = valid.iter().map(|(_, y)| *y).mean();

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in &valid {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    slope.is_finite().then_some(slope)
}

/// Pearson correlation coefficient over paired arrays.
///
/// Row-wise deletion: an index is used only when both sides are
/// defined there. Fewer than 2 valid pairs or zero variance in either
/// side is undefined.
#[must_use]
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| x.zip(*y))
        .collect();
    if valid.len() < 2 {
        return None;
    }

    let mean_x = valid.iter().map(|(x, _)| *x).mean();
    let mean_y = valid.iter().map(|(_, y)| *y).mean();

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in &valid {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then_some(r)
}

/// Year-over-year percent change, undefined when either operand is
/// missing or the base is zero.
#[must_use]
pub fn pct_change(prev: Option<f64>, curr: Option<f64>) -> Option<f64> {
    match (prev, curr) {
        (Some(p), Some(c)) if p != 0.0 => Some((c - p) / p * 100.0),
        _ => None,
    }
}

/// Qualitative reading of a count trend slope.
#[must_use]
pub fn interpret_trend(
    slope: Option<f64>,
    metric: &str,
    thresholds: &TrendThresholds,
) -> String {
    match slope {
        None => "Insufficient data to calculate trend".to_string(),
        Some(s) if s.abs() < thresholds.stability_band => {
            format!("{metric} has remained relatively stable over the period")
        }
        Some(s) if s > 0.0 => {
            format!("{metric} shows an increasing trend (+{s:.0} per year)")
        }
        Some(s) => format!("{metric} shows a decreasing trend ({s:.0} per year)"),
    }
}

/// Qualitative reading of a correlation coefficient: strength band by
/// absolute value, direction by sign.
#[must_use]
pub fn interpret_correlation(r: Option<f64>, bands: &CorrelationBands) -> String {
    let Some(r) = r else {
        return "Insufficient data to compute correlation".to_string();
    };

    let magnitude = r.abs();
    if magnitude < bands.weak {
        return "Very weak or no correlation".to_string();
    }

    let strength = if magnitude >= bands.strong {
        "Strong"
    } else if magnitude >= bands.moderate {
        "Moderate"
    } else {
        "Weak"
    };
    let direction = if r >= 0.0 { "positive" } else { "negative" };
    format!("{strength} {direction} correlation")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_has_zero_slope() {
        let pairs = [(2020.0, Some(10.0)), (2021.0, Some(10.0)), (2022.0, Some(10.0))];
        assert_eq!(trend_slope(&pairs), Some(0.0));
    }

    #[test]
    fn single_point_is_undefined() {
        assert_eq!(trend_slope(&[(2020.0, Some(10.0))]), None);
    }

    #[test]
    fn two_points_give_exact_slope() {
        let pairs = [(2020.0, Some(10.0)), (2021.0, Some(20.0))];
        assert_eq!(trend_slope(&pairs), Some(10.0));
    }

    #[test]
    fn missing_values_are_dropped_pairwise() {
        let pairs = [
            (2020.0, Some(10.0)),
            (2021.0, None),
            (2022.0, Some(20.0)),
        ];
        assert_eq!(trend_slope(&pairs), Some(5.0));
    }

    #[test]
    fn duplicate_years_are_undefined() {
        let pairs = [(2020.0, Some(10.0)), (2020.0, Some(20.0))];
        assert_eq!(trend_slope(&pairs), None);
    }

    #[test]
    fn perfect_correlation() {
        let xs = [Some(1.0), Some(2.0), Some(3.0)];
        let ys = [Some(1.0), Some(2.0), Some(3.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_is_undefined_not_nan() {
        let xs = [Some(1.0), Some(2.0)];
        let ys = [Some(5.0), Some(5.0)];
        assert_eq!(pearson(&xs, &ys), None);
    }

    #[test]
    fn pearson_rowwise_deletion() {
        let xs = [Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = [Some(2.0), Some(9.0), None, Some(8.0)];
        // Only indices 0 and 3 survive; two points correlate exactly.
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_guards_zero_base() {
        assert_eq!(pct_change(Some(0.0), Some(10.0)), None);
        assert_eq!(pct_change(None, Some(10.0)), None);
        assert_eq!(pct_change(Some(100.0), Some(110.0)), Some(10.0));
    }

    #[test]
    fn trend_interpretation_bands() {
        let t = TrendThresholds::default();
        assert_eq!(
            interpret_trend(None, "Enrolment", &t),
            "Insufficient data to calculate trend"
        );
        assert_eq!(
            interpret_trend(Some(50.0), "Enrolment", &t),
            "Enrolment has remained relatively stable over the period"
        );
        assert_eq!(
            interpret_trend(Some(250.0), "Enrolment", &t),
            "Enrolment shows an increasing trend (+250 per year)"
        );
        assert_eq!(
            interpret_trend(Some(-250.0), "Graduates", &t),
            "Graduates shows a decreasing trend (-250 per year)"
        );
    }

    #[test]
    fn correlation_interpretation_bands() {
        let b = CorrelationBands::default();
        assert_eq!(
            interpret_correlation(Some(0.85), &b),
            "Strong positive correlation"
        );
        assert_eq!(
            interpret_correlation(Some(-0.5), &b),
            "Moderate negative correlation"
        );
        assert_eq!(interpret_correlation(Some(0.25), &b), "Weak positive correlation");
        assert_eq!(
            interpret_correlation(Some(0.1), &b),
            "Very weak or no correlation"
        );
        assert_eq!(
            interpret_correlation(None, &b),
            "Insufficient data to compute correlation"
        );
    }
}
