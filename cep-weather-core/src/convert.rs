// 273, not 273.15: consumers depend on this exact output.
const KELVIN_OFFSET: f64 = 273.0;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// Formats a temperature with exactly one decimal place.
pub fn format_one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

pub fn celsius_string(celsius: f64) -> String {
    format_one_decimal(celsius)
}

pub fn fahrenheit_string(celsius: f64) -> String {
    format_one_decimal(celsius_to_fahrenheit(celsius))
}

pub fn kelvin_string(celsius: f64) -> String {
    format_one_decimal(celsius_to_kelvin(celsius))
}
