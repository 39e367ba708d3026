use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{convert, validator};

/// A postal code that passed validation. Only obtainable through [`PostalCode::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(raw: &str) -> Option<Self> {
        validator::validate(raw).then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locality resolved from a postal code. `name` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub celsius: f64,
    pub fahrenheit: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Output payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureResult {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub celsius: String,
    #[serde(rename = "temp_F")]
    pub fahrenheit: String,
    #[serde(rename = "temp_K")]
    pub kelvin: String,
}

impl TemperatureResult {
    pub fn new(location: &Location, reading: &WeatherReading) -> Self {
        Self {
            city: location.name.clone(),
            celsius: convert::celsius_string(reading.celsius),
            fahrenheit: convert::fahrenheit_string(reading.celsius),
            kelvin: convert::kelvin_string(reading.celsius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_code_parse_enforces_shape() {
        assert_eq!(PostalCode::parse("01001000").map(|c| c.to_string()), Some("01001000".into()));
        assert!(PostalCode::parse("01001-000").is_none());
    }

    #[test]
    fn result_serializes_with_wire_field_names() {
        let location = Location { name: "São Paulo".into() };
        let reading = WeatherReading { celsius: 25.3, fahrenheit: 77.5, observed_at: None };

        let json = serde_json::to_string(&TemperatureResult::new(&location, &reading))
            .expect("serialize");

        assert_eq!(
            json,
            r#"{"city":"São Paulo","temp_C":"25.3","temp_F":"77.5","temp_K":"298.3"}"#
        );
    }

    #[test]
    fn result_uses_celsius_not_provider_fahrenheit() {
        let location = Location { name: "Recife".into() };
        // Provider fahrenheit disagrees; output is derived from celsius only.
        let reading = WeatherReading { celsius: 0.0, fahrenheit: 31.9, observed_at: None };

        let result = TemperatureResult::new(&location, &reading);
        assert_eq!(result.fahrenheit, "32.0");
        assert_eq!(result.kelvin, "273.0");
    }
}
