//! Differencing helpers for ARIMA models

use statrs::statistics::Statistics;

/// Difference a series `d` times
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values that continue `original`.
///
/// Each level is re-accumulated from the last value of the matching
/// difference of `original`.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let mut acc = difference(original, level).last().copied().unwrap_or(0.0);
        for value in result.iter_mut() {
            acc += *value;
            *value = acc;
        }
    }
    result
}

/// Suggest a differencing order (0, 1 or 2) with a variance ratio test
pub fn suggest_differencing(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;

    while d < max_d && current.len() >= 3 {
        let before = current.iter().variance();
        let next = difference(&current, 1);
        let after = next.iter().variance();

        // Constant series need no differencing
        if !(before > 0.0) || !(after / before < 0.9) {
            break;
        }
        current = next;
        d += 1;
    }

    d
}
