use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

/// A temperature in Kelvin, the unit every provider normalises to.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kelvin(pub f64);

impl Kelvin {
    pub fn from_celsius(celsius: f64) -> Self {
        Self(celsius + ZERO_CELSIUS_IN_KELVIN)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn celsius(self) -> f64 {
        self.0 - ZERO_CELSIUS_IN_KELVIN
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} K", self.0)
    }
}

/// Result of one aggregation, shaped for the caller-facing output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    /// Combined temperature in Kelvin.
    pub temp: Kelvin,
    pub temp_c: f64,
    /// Wall-clock time the aggregation took, e.g. "312.5ms".
    pub took: String,
    pub observed_at: DateTime<Utc>,
}

impl TemperatureReport {
    pub fn new(city: impl Into<String>, temp: Kelvin, took: Duration) -> Self {
        Self {
            city: city.into(),
            temp,
            temp_c: temp.celsius(),
            took: format!("{took:?}"),
            observed_at: Utc::now(),
        }
    }
}
