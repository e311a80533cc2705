//! Regression between a target measurement and explanatory measurements
//! attached to the same locations.

pub mod ridge;
pub mod stats;

use crate::frame::SociomeDataFrame;
use crate::types::Value;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use ridge::{impute_and_standardize, Ridge};
use serde::{Deserialize, Serialize};
use stats::{mean_squared_error, pearson, r2_score};

pub const DEFAULT_ALPHA: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRow {
    pub variable: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcRow {
    pub variable: String,
    pub ic: f64,
}

/// Summary of a fit. All quantities are in standardised units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitStats {
    /// Information coefficient: correlation between target and prediction.
    pub ic: f64,
    pub mse: f64,
    pub r2: f64,
    pub intercept: f64,
    pub coefficients: Vec<(String, f64)>,
    /// Sorted ascending by |coefficient|.
    pub effects_table: Vec<EffectRow>,
    /// Per-variable |IC| with the target, plus `All` for the model;
    /// sorted ascending by |IC|.
    pub ic_table: Vec<IcRow>,
    pub rows: usize,
    pub fitted_at: DateTime<Utc>,
}

/// Ridge regression of a target variable on explanatory variables, both
/// mean-imputed and standardised before fitting.
#[derive(Debug, Clone)]
pub struct GeospatialLinearModel {
    pub target: String,
    pub explanatory: Vec<String>,
    pub alpha: f64,
    model: Ridge,
    pub stats: Option<FitStats>,
}

impl GeospatialLinearModel {
    pub fn new(target: &str, explanatory: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            explanatory: explanatory.iter().map(|s| s.to_string()).collect(),
            alpha: DEFAULT_ALPHA,
            model: Ridge::new(DEFAULT_ALPHA),
            stats: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self.model = Ridge::new(alpha);
        self
    }

    /// Fit on `frame` and return a frame holding the prediction and residual
    /// columns alongside the original geometry.
    pub fn fit(&mut self, frame: &SociomeDataFrame, prediction_name: &str, residual_name: &str) -> Result<SociomeDataFrame> {
        if self.explanatory.is_empty() {
            bail!("At least one explanatory variable is required");
        }
        if frame.len() < 2 {
            bail!("Need at least two rows to fit a model, got {}", frame.len());
        }
        if prediction_name == residual_name {
            bail!("Prediction and residual columns need distinct names");
        }
        info!(
            "Fitting {} ~ {} on {} rows",
            self.target,
            self.explanatory.join(" + "),
            frame.len()
        );

        let mut x = self
            .explanatory
            .iter()
            .map(|name| frame.numeric_column(name))
            .collect::<Result<Vec<_>>>()?;
        impute_and_standardize(&mut x);

        let mut y = vec![frame.numeric_column(&self.target)?];
        impute_and_standardize(&mut y);
        let y = y.remove(0);

        self.model = Ridge::new(self.alpha);
        self.model.fit(&x, &y)?;
        let predicted = self.model.predict(&x);
        self.stats = Some(self.compile_stats(&x, &y, &predicted));

        let mut out = frame.geometry_frame();
        out.set_column(prediction_name, predicted.iter().map(|v| Value::Number(*v)).collect())?;
        out.set_column(
            residual_name,
            y.iter().zip(&predicted).map(|(t, p)| Value::Number(t - p)).collect(),
        )?;
        Ok(out)
    }

    fn compile_stats(&self, x: &[Vec<f64>], y: &[f64], predicted: &[f64]) -> FitStats {
        let coefficients: Vec<(String, f64)> = self
            .explanatory
            .iter()
            .cloned()
            .zip(self.model.coefficients.iter().copied())
            .collect();
        let ic = pearson(y, predicted);

        let mut effects_table: Vec<EffectRow> = coefficients
            .iter()
            .map(|(variable, coefficient)| EffectRow {
                variable: variable.clone(),
                coefficient: *coefficient,
            })
            .collect();
        effects_table.sort_by(|a, b| a.coefficient.abs().total_cmp(&b.coefficient.abs()));

        let mut ic_table: Vec<IcRow> = self
            .explanatory
            .iter()
            .zip(x)
            .map(|(variable, col)| IcRow {
                variable: variable.clone(),
                ic: pearson(col, y).abs(),
            })
            .collect();
        ic_table.push(IcRow {
            variable: "All".to_string(),
            ic,
        });
        ic_table.sort_by(|a, b| a.ic.abs().total_cmp(&b.ic.abs()));

        let stats = FitStats {
            ic,
            mse: mean_squared_error(y, predicted),
            r2: r2_score(y, predicted),
            intercept: self.model.intercept,
            coefficients,
            effects_table,
            ic_table,
            rows: y.len(),
            fitted_at: Utc::now(),
        };
        debug!("Fit statistics: ic={:.4} mse={:.4} r2={:.4}", stats.ic, stats.mse, stats.r2);
        stats
    }
}
