/// Pearson correlation; NaN when either side has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    cov / (var_a * var_b).sqrt()
}

pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    truth.iter().zip(predicted).map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n as f64
}

/// Coefficient of determination. A constant truth yields 1.0 for a perfect
/// prediction and 0.0 otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean = truth[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = truth.iter().zip(predicted).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = truth[..n].iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_and_inverse_correlation() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn r2_and_mse() {
        let truth = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&truth, &truth), 1.0);
        assert!((r2_score(&truth, &[2.0, 2.0, 2.0])).abs() < 1e-12);
        assert!((mean_squared_error(&truth, &[1.0, 2.0, 4.0]) - 1.0 / 3.0).abs() < 1e-12);
    }
}
