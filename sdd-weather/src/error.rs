/// Error types for weather fetching and aggregation
use crate::parameter::{Mode, Parameter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// The request was rejected before any I/O took place
    #[error("Invalid weather request: {0}")]
    InvalidRequest(String),

    /// A parameter outside the vocabulary of the requested mode
    #[error("Parameter {parameter} is not available in {mode} mode")]
    UnsupportedParameter { parameter: Parameter, mode: Mode },

    /// A series lacks a parameter the caller needs
    #[error("Series is missing required parameter {0}")]
    MissingParameter(Parameter),

    /// The response body could not be turned into a series
    #[error("Malformed weather response: {0}")]
    MalformedResponse(String),

    /// The API answered with a client error; retrying will not help
    #[error("Weather API rejected the request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// Retry budget exhausted
    #[error("Weather data unavailable after {attempts} attempts: {last_error}")]
    DataUnavailable { attempts: u32, last_error: String },

    /// Failed to construct the HTTP client
    #[cfg(feature = "api")]
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Type alias for Results using WeatherError
pub type Result<T> = std::result::Result<T, WeatherError>;
