//! Pre-trained damage classifiers.
//!
//! A model is an opaque scorer that declares the feature columns it was fit
//! on and returns the positive-class probability for each input row. The
//! shipped artifacts are logistic regressions serialized as JSON:
//!
//! ```json
//! {
//!   "name": "building",
//!   "feature_names": ["wind_gusts_10m", "building_area"],
//!   "coefficients": [0.21, 0.0004],
//!   "intercept": -6.3,
//!   "scaler": { "mean": [9.0, 850.0], "scale": [4.5, 400.0] }
//! }
//! ```

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A binary classifier over named numeric features.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Column names, in the order `predict_proba` expects them.
    fn feature_names(&self) -> &[String];

    /// Probability of the positive class for each row.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Standardization applied before the linear term: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub name: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

impl LogisticModel {
    pub fn from_json(json: &str) -> Result<Self> {
        let model: LogisticModel = serde_json::from_str(json)
            .map_err(|e| ScoringError::Model(format!("invalid model JSON: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::Model(format!("cannot read {}: {e}", path.display())))?;
        let model = Self::from_json(&json)?;
        log::info!(
            "Loaded model '{}' with {} features from {}",
            model.name,
            model.feature_names.len(),
            path.display()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ScoringError::Model(format!("model '{}' has no features", self.name)));
        }
        if self.coefficients.len() != n {
            return Err(ScoringError::Model(format!(
                "model '{}' has {} features but {} coefficients",
                self.name,
                n,
                self.coefficients.len()
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(ScoringError::Model(format!(
                    "model '{}' scaler does not match its {} features",
                    self.name, n
                )));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(ScoringError::Model(format!(
                    "model '{}' scaler has a zero or non-finite scale",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn decision(&self, row: &[f64]) -> f64 {
        let linear: f64 = row
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let x = match &self.scaler {
                    Some(s) => (x - s.mean[i]) / s.scale[i],
                    None => *x,
                };
                self.coefficients[i] * x
            })
            .sum();
        self.intercept + linear
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.feature_names.len() {
                    return Err(ScoringError::Model(format!(
                        "model '{}' expects {} values per row, got {}",
                        self.name,
                        self.feature_names.len(),
                        row.len()
                    )));
                }
                Ok(sigmoid(self.decision(row)))
            })
            .collect()
    }
}
