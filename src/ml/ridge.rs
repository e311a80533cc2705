use anyhow::{bail, Result};

/// Replace NaN cells by their column mean (0 when the whole column is
/// missing), then standardise every column to zero mean and unit
/// population variance. Constant columns are centred but not scaled.
pub fn impute_and_standardize(columns: &mut [Vec<f64>]) {
    for col in columns.iter_mut() {
        let present: Vec<f64> = col.iter().copied().filter(|v| v.is_finite()).collect();
        let fill = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        for v in col.iter_mut() {
            if !v.is_finite() {
                *v = fill;
            }
        }

        let n = col.len().max(1) as f64;
        let mean = col.iter().sum::<f64>() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let scale = if std > f64::EPSILON { std } else { 1.0 };
        for v in col.iter_mut() {
            *v = (*v - mean) / scale;
        }
    }
}

/// Ridge regression with an unpenalised intercept.
#[derive(Debug, Clone)]
pub struct Ridge {
    pub alpha: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Ridge {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: Vec::new(),
            intercept: 0.0,
        }
    }

    /// Fit on column-major features `x` (one Vec per feature) and target `y`.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let n = y.len();
        let p = x.len();
        if n == 0 {
            bail!("Cannot fit a model on zero rows");
        }
        if x.iter().any(|col| col.len() != n) {
            bail!("Feature columns must all have {} rows", n);
        }

        let x_means: Vec<f64> = x.iter().map(|col| col.iter().sum::<f64>() / n as f64).collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;

        // Normal equations on centred data: (XᵀX + αI) β = Xᵀy
        let mut gram = vec![vec![0.0; p]; p];
        let mut rhs = vec![0.0; p];
        for i in 0..p {
            for j in i..p {
                let s: f64 = (0..n).map(|r| (x[i][r] - x_means[i]) * (x[j][r] - x_means[j])).sum();
                gram[i][j] = s;
                gram[j][i] = s;
            }
            gram[i][i] += self.alpha;
            rhs[i] = (0..n).map(|r| (x[i][r] - x_means[i]) * (y[r] - y_mean)).sum();
        }

        let beta = solve(gram, rhs)?;
        self.intercept = y_mean - beta.iter().zip(&x_means).map(|(b, m)| b * m).sum::<f64>();
        self.coefficients = beta;
        Ok(())
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        let n = x.first().map(Vec::len).unwrap_or(0);
        (0..n)
            .map(|r| {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(x)
                        .map(|(b, col)| b * col[r])
                        .sum::<f64>()
            })
            .collect()
    }
}

// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().partial_cmp(&a[j][col].abs()).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            bail!("Design matrix is singular; add regularisation or drop collinear variables");
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let s: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - s) / a[row][row];
    }
    Ok(x)
}
