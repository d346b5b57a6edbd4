pub mod cache;
#[cfg(feature = "api")]
pub mod client;
pub mod daily;
pub mod date_range;
pub mod error;
pub mod hourly;
pub mod parameter;
