//! Grid × weather cross-join scoring.
//!
//! Every grid cell is combined with every weather row and each combination
//! is scored by both damage models. The product is materialized in full
//! (O(|grid|·|rows|) memory) because the consumer needs every cell and date
//! at once; [`MAX_PREDICTION_ROWS`] bounds it.
//!
//! Output order is grid-major, date-minor: all dates of the first cell, then
//! all dates of the second, and so on.

use crate::error::{Result, ScoringError};
use crate::manual::ManualScenario;
use crate::model::Classifier;
use chrono::NaiveDate;
use sdd_db::models::GridCell;
use sdd_features::DailyFeatureRow;
use serde::Serialize;

/// Largest cross product the scorer will materialize.
pub const MAX_PREDICTION_ROWS: usize = 2_000_000;

/// Named weather values combined with a grid cell.
///
/// `None` means "no such column", `Some(None)` a column without a value.
pub trait FeatureSource {
    fn feature(&self, name: &str) -> Option<Option<f64>>;
}

impl FeatureSource for DailyFeatureRow {
    fn feature(&self, name: &str) -> Option<Option<f64>> {
        DailyFeatureRow::feature(self, name)
    }
}

impl FeatureSource for ManualScenario {
    fn feature(&self, name: &str) -> Option<Option<f64>> {
        ManualScenario::feature(self, name)
    }
}

/// Damage probabilities for one cell on one date (no date for manual runs).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub cell_id: String,
    pub service_area: String,
    pub date: Option<NaiveDate>,
    pub building_proba: f64,
    pub tree_proba: f64,
    /// `building_proba + tree_proba`. Not a joint probability: the two events
    /// are not independent, and the sum may exceed 1.
    pub total_proba: f64,
}

/// Score every (cell, date) combination of `grid` and `features`.
pub fn score_forecast(
    grid: &[GridCell],
    features: &[DailyFeatureRow],
    building: &dyn Classifier,
    tree: &dyn Classifier,
) -> Result<Vec<PredictionRow>> {
    let sources: Vec<(Option<NaiveDate>, &dyn FeatureSource)> = features
        .iter()
        .map(|row| (Some(row.date), row as &dyn FeatureSource))
        .collect();
    score_cross_join(grid, &sources, building, tree)
}

/// Score a single scenario against every cell.
pub fn score_manual(
    grid: &[GridCell],
    scenario: &ManualScenario,
    building: &dyn Classifier,
    tree: &dyn Classifier,
) -> Result<Vec<PredictionRow>> {
    score_cross_join(grid, &[(None, scenario as &dyn FeatureSource)], building, tree)
}

fn score_cross_join(
    grid: &[GridCell],
    sources: &[(Option<NaiveDate>, &dyn FeatureSource)],
    building: &dyn Classifier,
    tree: &dyn Classifier,
) -> Result<Vec<PredictionRow>> {
    let rows = grid
        .len()
        .checked_mul(sources.len())
        .unwrap_or(usize::MAX);
    if rows > MAX_PREDICTION_ROWS {
        return Err(ScoringError::TooManyRows {
            rows,
            limit: MAX_PREDICTION_ROWS,
        });
    }

    let building_proba = building.predict_proba(&design_matrix(grid, sources, building)?)?;
    let tree_proba = tree.predict_proba(&design_matrix(grid, sources, tree)?)?;
    for (model, proba) in [(building, &building_proba), (tree, &tree_proba)] {
        if proba.len() != rows {
            return Err(ScoringError::Model(format!(
                "model '{}' returned {} probabilities for {} rows",
                model.name(),
                proba.len(),
                rows
            )));
        }
        if let Some(bad) = proba.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ScoringError::Model(format!(
                "model '{}' returned probability {} outside [0, 1]",
                model.name(),
                bad
            )));
        }
    }

    let predictions: Vec<PredictionRow> = grid
        .iter()
        .flat_map(|cell| sources.iter().map(move |(date, _)| (cell, *date)))
        .zip(building_proba.into_iter().zip(tree_proba))
        .map(|((cell, date), (building_proba, tree_proba))| PredictionRow {
            cell_id: cell.cell_id.clone(),
            service_area: cell.service_area.clone(),
            date,
            building_proba,
            tree_proba,
            total_proba: building_proba + tree_proba,
        })
        .collect();
    log::info!(
        "Scored {} rows ({} cells x {} weather rows)",
        predictions.len(),
        grid.len(),
        sources.len()
    );
    Ok(predictions)
}

/// The model's input rows in grid-major, date-minor order.
///
/// Grid covariates take precedence over weather columns of the same name.
fn design_matrix(
    grid: &[GridCell],
    sources: &[(Option<NaiveDate>, &dyn FeatureSource)],
    model: &dyn Classifier,
) -> Result<Vec<Vec<f64>>> {
    let mut matrix = Vec::with_capacity(grid.len() * sources.len());
    for cell in grid {
        for (date, source) in sources {
            let row = model
                .feature_names()
                .iter()
                .map(|name| {
                    match cell.covariate(name).or_else(|| source.feature(name)) {
                        Some(Some(value)) => Ok(value),
                        Some(None) => Err(ScoringError::NullFeature {
                            model: model.name().to_string(),
                            feature: name.clone(),
                            cell_id: cell.cell_id.clone(),
                            date: *date,
                        }),
                        None => Err(ScoringError::SchemaMismatch {
                            model: model.name().to_string(),
                            feature: name.clone(),
                        }),
                    }
                })
                .collect::<Result<Vec<f64>>>()?;
            matrix.push(row);
        }
    }
    Ok(matrix)
}

/// The rows of `predictions` that fall on `date`, in their existing order.
pub fn rows_on(predictions: &[PredictionRow], date: NaiveDate) -> Vec<PredictionRow> {
    predictions
        .iter()
        .filter(|row| row.date == Some(date))
        .cloned()
        .collect()
}
