//! Small statistical building blocks shared by the analyzer.
//!
//! Variances and standard deviations use the sample (N−1) denominator
//! throughout. Quantiles interpolate linearly between order statistics.

use crate::error::TrendError;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

/// Ordinary least-squares fit of `ys` against `0, 1, 2, …`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value for a zero slope; `None` with fewer than three points.
    pub p_value: Option<f64>,
}

pub fn linear_regression(ys: &[f64]) -> Result<LinearFit, TrendError> {
    let n = ys.len();
    if n < 2 {
        return Err(TrendError::Calculation(format!(
            "linear regression needs at least 2 points, got {n}"
        )));
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = ys.mean();

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    // A constant series has no variance to explain.
    let r = if syy > 0.0 {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let p_value = if n > 2 {
        Some(correlation_p_value(r, n)?)
    } else {
        None
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared: r * r,
        p_value,
    })
}

/// Two-sided p-value of a correlation coefficient `r` over `n` pairs.
pub fn correlation_p_value(r: f64, n: usize) -> Result<f64, TrendError> {
    let df = n as f64 - 2.0;
    if df <= 0.0 {
        return Err(TrendError::Calculation(format!(
            "correlation test needs at least 3 pairs, got {n}"
        )));
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    two_sided_t_p_value(t, df)
}

/// P(|T| >= |t|) for Student's t with `df` degrees of freedom.
pub fn two_sided_t_p_value(t: f64, df: f64) -> Result<f64, TrendError> {
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| TrendError::Calculation(e.to_string()))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Result of Welch's unequal-variance two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom; `None` when both samples are constant.
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
}

/// Both samples need at least two values.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<WelchTest, TrendError> {
    if a.len() < 2 || b.len() < 2 {
        return Err(TrendError::Calculation(format!(
            "t-test needs at least 2 values per sample, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let diff = a.mean() - b.mean();
    let qa = a.variance() / na;
    let qb = b.variance() / nb;
    let se2 = qa + qb;

    if se2 == 0.0 {
        // Two constant samples: either identical or infinitely far apart.
        let (t_statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return Ok(WelchTest { t_statistic, degrees_of_freedom: None, p_value });
    }

    let t_statistic = diff / se2.sqrt();
    let df = se2 * se2 / (qa * qa / (na - 1.0) + qb * qb / (nb - 1.0));
    let p_value = two_sided_t_p_value(t_statistic, df)?;

    Ok(WelchTest {
        t_statistic,
        degrees_of_freedom: Some(df),
        p_value,
    })
}

/// Linear-interpolated quantile of an ascending slice. `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

/// 1-based ranks, ties receiving the average of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Pearson's r, or `None` when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let x_mean = xs.mean();
    let y_mean = ys.mean();

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Spearman's rank correlation: Pearson's r over average ranks.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// Bias-adjusted sample skewness (G1). Needs three values; 0 for a constant sample.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mean = values.mean();
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    Some(n * (n - 1.0).sqrt() / (n - 2.0) * m3 / m2.powf(1.5))
}

/// Bias-adjusted excess kurtosis (G2). Needs four values; 0 for a constant sample.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let mean = values.mean();
    let (m2, m4) = values.iter().fold((0.0, 0.0), |(m2, m4), v| {
        let d2 = (v - mean) * (v - mean);
        (m2 + d2, m4 + d2 * d2)
    });
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let numerator = n * (n + 1.0) * (n - 1.0) * m4;
    let denominator = (n - 2.0) * (n - 3.0) * m2 * m2;
    let adjustment = 3.0 * (n - 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    Some(numerator / denominator - adjustment)
}

/// Spread at or below this fraction of |mean| is rounding noise, not variation.
const RELATIVE_SPREAD_EPSILON: f64 = 1e-12;

/// Mean and sample stddev, or `None` when there is no spread to standardize by.
pub fn mean_and_stddev(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.mean();
    let stddev = values.std_dev();
    let spread = stddev.is_finite() && stddev > RELATIVE_SPREAD_EPSILON * mean.abs();
    spread.then_some((mean, stddev))
}
