use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An hourly variable understood by the Open-Meteo archive and forecast APIs.
///
/// The set is closed: only the variables the dashboard asks for are modelled,
/// and each [`Mode`] accepts a fixed subset of them.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature2m,
    PrecipitationProbability,
    Precipitation,
    Rain,
    Showers,
    Snowfall,
    SnowDepth,
    SurfacePressure,
    WindSpeed10m,
    WindDirection10m,
    WindGusts10m,
    // Forecast soil layers
    SoilTemperature0cm,
    SoilTemperature6cm,
    SoilTemperature18cm,
    SoilTemperature54cm,
    SoilMoisture0To1cm,
    SoilMoisture1To3cm,
    SoilMoisture3To9cm,
    SoilMoisture9To27cm,
    SoilMoisture27To81cm,
    // Archive soil layers
    SoilTemperature0To7cm,
    SoilTemperature7To28cm,
    SoilTemperature28To100cm,
    SoilTemperature100To255cm,
    SoilMoisture0To7cm,
    SoilMoisture7To28cm,
    SoilMoisture28To100cm,
    SoilMoisture100To255cm,
}

/// Which endpoint a request is addressed to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    Historical,
    Forecast,
}

/// Variables available from the forecast endpoint.
pub const FORECAST_PARAMETERS: [Parameter; 20] = [
    Parameter::Temperature2m,
    Parameter::PrecipitationProbability,
    Parameter::Precipitation,
    Parameter::Rain,
    Parameter::Showers,
    Parameter::Snowfall,
    Parameter::SnowDepth,
    Parameter::SurfacePressure,
    Parameter::WindSpeed10m,
    Parameter::WindDirection10m,
    Parameter::WindGusts10m,
    Parameter::SoilTemperature0cm,
    Parameter::SoilTemperature6cm,
    Parameter::SoilTemperature18cm,
    Parameter::SoilTemperature54cm,
    Parameter::SoilMoisture0To1cm,
    Parameter::SoilMoisture1To3cm,
    Parameter::SoilMoisture3To9cm,
    Parameter::SoilMoisture9To27cm,
    Parameter::SoilMoisture27To81cm,
];

/// Variables available from the historical archive endpoint.
pub const HISTORICAL_PARAMETERS: [Parameter; 17] = [
    Parameter::Temperature2m,
    Parameter::Precipitation,
    Parameter::Rain,
    Parameter::Snowfall,
    Parameter::SnowDepth,
    Parameter::SurfacePressure,
    Parameter::WindSpeed10m,
    Parameter::WindDirection10m,
    Parameter::WindGusts10m,
    Parameter::SoilTemperature0To7cm,
    Parameter::SoilTemperature7To28cm,
    Parameter::SoilTemperature28To100cm,
    Parameter::SoilTemperature100To255cm,
    Parameter::SoilMoisture0To7cm,
    Parameter::SoilMoisture7To28cm,
    Parameter::SoilMoisture28To100cm,
    Parameter::SoilMoisture100To255cm,
];

/// Variables shown on the current-weather view (requested in forecast mode).
pub const CURRENT_PARAMETERS: [Parameter; 9] = [
    Parameter::Temperature2m,
    Parameter::Precipitation,
    Parameter::Rain,
    Parameter::Showers,
    Parameter::Snowfall,
    Parameter::SurfacePressure,
    Parameter::WindSpeed10m,
    Parameter::WindDirection10m,
    Parameter::WindGusts10m,
];

/// Variables the predictor pipeline needs from both endpoints.
pub const PREDICTOR_PARAMETERS: [Parameter; 3] = [
    Parameter::Precipitation,
    Parameter::WindSpeed10m,
    Parameter::WindGusts10m,
];

const ALL_PARAMETERS: [Parameter; 28] = [
    Parameter::Temperature2m,
    Parameter::PrecipitationProbability,
    Parameter::Precipitation,
    Parameter::Rain,
    Parameter::Showers,
    Parameter::Snowfall,
    Parameter::SnowDepth,
    Parameter::SurfacePressure,
    Parameter::WindSpeed10m,
    Parameter::WindDirection10m,
    Parameter::WindGusts10m,
    Parameter::SoilTemperature0cm,
    Parameter::SoilTemperature6cm,
    Parameter::SoilTemperature18cm,
    Parameter::SoilTemperature54cm,
    Parameter::SoilMoisture0To1cm,
    Parameter::SoilMoisture1To3cm,
    Parameter::SoilMoisture3To9cm,
    Parameter::SoilMoisture9To27cm,
    Parameter::SoilMoisture27To81cm,
    Parameter::SoilTemperature0To7cm,
    Parameter::SoilTemperature7To28cm,
    Parameter::SoilTemperature28To100cm,
    Parameter::SoilTemperature100To255cm,
    Parameter::SoilMoisture0To7cm,
    Parameter::SoilMoisture7To28cm,
    Parameter::SoilMoisture28To100cm,
    Parameter::SoilMoisture100To255cm,
];

impl Parameter {
    /// The variable name used on the wire and as a column header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature2m => "temperature_2m",
            Parameter::PrecipitationProbability => "precipitation_probability",
            Parameter::Precipitation => "precipitation",
            Parameter::Rain => "rain",
            Parameter::Showers => "showers",
            Parameter::Snowfall => "snowfall",
            Parameter::SnowDepth => "snow_depth",
            Parameter::SurfacePressure => "surface_pressure",
            Parameter::WindSpeed10m => "wind_speed_10m",
            Parameter::WindDirection10m => "wind_direction_10m",
            Parameter::WindGusts10m => "wind_gusts_10m",
            Parameter::SoilTemperature0cm => "soil_temperature_0cm",
            Parameter::SoilTemperature6cm => "soil_temperature_6cm",
            Parameter::SoilTemperature18cm => "soil_temperature_18cm",
            Parameter::SoilTemperature54cm => "soil_temperature_54cm",
            Parameter::SoilMoisture0To1cm => "soil_moisture_0_to_1cm",
            Parameter::SoilMoisture1To3cm => "soil_moisture_1_to_3cm",
            Parameter::SoilMoisture3To9cm => "soil_moisture_3_to_9cm",
            Parameter::SoilMoisture9To27cm => "soil_moisture_9_to_27cm",
            Parameter::SoilMoisture27To81cm => "soil_moisture_27_to_81cm",
            Parameter::SoilTemperature0To7cm => "soil_temperature_0_to_7cm",
            Parameter::SoilTemperature7To28cm => "soil_temperature_7_to_28cm",
            Parameter::SoilTemperature28To100cm => "soil_temperature_28_to_100cm",
            Parameter::SoilTemperature100To255cm => "soil_temperature_100_to_255cm",
            Parameter::SoilMoisture0To7cm => "soil_moisture_0_to_7cm",
            Parameter::SoilMoisture7To28cm => "soil_moisture_7_to_28cm",
            Parameter::SoilMoisture28To100cm => "soil_moisture_28_to_100cm",
            Parameter::SoilMoisture100To255cm => "soil_moisture_100_to_255cm",
        }
    }

    /// Returns true if the endpoint for `mode` serves this variable.
    pub fn is_available(&self, mode: Mode) -> bool {
        mode.vocabulary().contains(self)
    }
}

impl Mode {
    /// The fixed set of variables the endpoint for this mode accepts.
    pub fn vocabulary(&self) -> &'static [Parameter] {
        match self {
            Mode::Historical => &HISTORICAL_PARAMETERS,
            Mode::Forecast => &FORECAST_PARAMETERS,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Historical => f.write_str("historical"),
            Mode::Forecast => f.write_str("forecast"),
        }
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_PARAMETERS
            .iter()
            .find(|p| p.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("unknown weather parameter: {wanted}"))
    }
}
