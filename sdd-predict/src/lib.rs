//! Storm damage scoring.
//!
//! Crosses the static grid with daily weather predictors (or a single manual
//! scenario) and scores every combination with a building-damage and a
//! tree-damage classifier.

pub mod error;
pub mod manual;
pub mod model;
pub mod scorer;

pub use error::ScoringError;
pub use manual::ManualScenario;
pub use model::{Classifier, LogisticModel};
pub use scorer::{score_forecast, score_manual, FeatureSource, PredictionRow, MAX_PREDICTION_ROWS};
