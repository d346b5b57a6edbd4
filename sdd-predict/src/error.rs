/// Error types for model loading and scoring
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    /// A model asks for a column neither the grid nor the weather row has
    #[error("Model '{model}' expects unknown feature '{feature}'")]
    SchemaMismatch { model: String, feature: String },

    /// A known feature has no value for one combined row
    #[error("Model '{model}': feature '{feature}' is null for cell {cell_id} on {date:?}")]
    NullFeature {
        model: String,
        feature: String,
        cell_id: String,
        date: Option<NaiveDate>,
    },

    /// The cross product would not fit the row budget
    #[error("Cross join of {rows} rows exceeds the limit of {limit}")]
    TooManyRows { rows: usize, limit: usize },

    /// The model artifact is unreadable or inconsistent
    #[error("Model error: {0}")]
    Model(String),
}

/// Type alias for Results using ScoringError
pub type Result<T> = std::result::Result<T, ScoringError>;
