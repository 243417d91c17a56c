//! Weather recommendation form: per-field validation and blur normalisation.
//!
//! The form holds raw text exactly as typed. Two operations act on it:
//!
//! - [`WeatherForm::blur`] normalises one field when the user leaves it:
//!   clamp to the field's `min`/`max`, then round to its `step`. Text that
//!   is not a number is left alone so validation can report it.
//! - [`WeatherForm::validate`] checks every field and either builds a
//!   [`WeatherQuery`] or returns one message per invalid field.
//!
//! # Field rules
//!
//! | field         | required | range      | step | whole |
//! |---------------|----------|------------|------|-------|
//! | location      | yes      |            |      |       |
//! | month         | yes      | 1..=12     |      | yes   |
//! | temperature_c | yes      | -50..=60   | 0.1  |       |
//! | humidity_pct  | yes      | 0..=100    | 1    | yes   |
//! | wind_kmh      | yes      | >= 0       | 0.1  |       |
//!
//! Blur bounds are the input attributes of the form, which are looser than
//! validation for temperature (no clamp, only rounding).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::report::WeatherQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherField {
    Location,
    Month,
    #[serde(rename = "temperature_c")]
    Temperature,
    #[serde(rename = "humidity_pct")]
    Humidity,
    #[serde(rename = "wind_kmh")]
    Wind,
}

/// Blur-time bounds of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl WeatherField {
    pub const ALL: [WeatherField; 5] = [
        WeatherField::Location,
        WeatherField::Month,
        WeatherField::Temperature,
        WeatherField::Humidity,
        WeatherField::Wind,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            WeatherField::Location => "location",
            WeatherField::Month => "month",
            WeatherField::Temperature => "temperature_c",
            WeatherField::Humidity => "humidity_pct",
            WeatherField::Wind => "wind_kmh",
        }
    }

    pub fn bounds(self) -> FieldBounds {
        let (min, max, step) = match self {
            WeatherField::Location => (None, None, None),
            WeatherField::Month => (Some(1.0), Some(12.0), None),
            WeatherField::Temperature => (None, None, Some(0.1)),
            WeatherField::Humidity => (Some(0.0), Some(100.0), Some(1.0)),
            WeatherField::Wind => (Some(0.0), None, Some(0.1)),
        };
        FieldBounds { min, max, step }
    }
}

impl fmt::Display for WeatherField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw form state, one string per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherForm {
    pub location: String,
    pub month: String,
    pub temperature_c: String,
    pub humidity_pct: String,
    pub wind_kmh: String,
}

impl WeatherForm {
    pub fn get(&self, field: WeatherField) -> &str {
        match field {
            WeatherField::Location => &self.location,
            WeatherField::Month => &self.month,
            WeatherField::Temperature => &self.temperature_c,
            WeatherField::Humidity => &self.humidity_pct,
            WeatherField::Wind => &self.wind_kmh,
        }
    }

    pub fn set(&mut self, field: WeatherField, value: impl Into<String>) {
        let slot = match field {
            WeatherField::Location => &mut self.location,
            WeatherField::Month => &mut self.month,
            WeatherField::Temperature => &mut self.temperature_c,
            WeatherField::Humidity => &mut self.humidity_pct,
            WeatherField::Wind => &mut self.wind_kmh,
        };
        *slot = value.into();
    }

    /// Normalise a field after editing. Returns `true` if the text changed.
    pub fn blur(&mut self, field: WeatherField) -> bool {
        if field == WeatherField::Location {
            return false;
        }
        let current = self.get(field);
        let bounds = field.bounds();
        let clamped = clamp(current, bounds.min, bounds.max);
        let next = match bounds.step {
            Some(step) => round_to_step(&clamped, step),
            None => clamped,
        };
        if next != current {
            self.set(field, next);
            true
        } else {
            false
        }
    }

    /// Blur every field, as a submit does for untouched inputs.
    pub fn blur_all(&mut self) {
        for field in WeatherField::ALL {
            self.blur(field);
        }
    }

    /// Per-field error messages, in form order. Empty when valid.
    pub fn errors(&self) -> Vec<(WeatherField, String)> {
        WeatherField::ALL
            .into_iter()
            .filter_map(|field| check_field(field, self.get(field)).map(|msg| (field, msg)))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Build the request payload, or report every invalid field.
    pub fn validate(&self) -> Result<WeatherQuery, ValidationError> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(ValidationError::Weather(errors));
        }
        // Every field parsed in `check_field`; these cannot fail here.
        let num = |s: &str| parse_number(s).unwrap_or_default();
        Ok(WeatherQuery {
            location: self.location.trim().to_string(),
            month: num(&self.month) as u8,
            temperature_c: num(&self.temperature_c),
            humidity_pct: num(&self.humidity_pct) as u8,
            wind_kmh: num(&self.wind_kmh),
        })
    }
}

fn check_field(field: WeatherField, raw: &str) -> Option<String> {
    let (label, required) = match field {
        WeatherField::Location => {
            return raw
                .trim()
                .is_empty()
                .then(|| "Location is required".to_string());
        }
        WeatherField::Month => ("Month", "Month is required"),
        WeatherField::Temperature => ("Temperature", "Temperature is required"),
        WeatherField::Humidity => ("Humidity", "Humidity is required"),
        WeatherField::Wind => ("Wind", "Wind speed is required"),
    };

    if raw.trim().is_empty() {
        return Some(required.to_string());
    }
    let Some(n) = parse_number(raw) else {
        return Some(format!("{label} must be a number"));
    };

    match field {
        WeatherField::Month if !(1.0..=12.0).contains(&n) => Some("Month must be 1–12".into()),
        WeatherField::Month if n.fract() != 0.0 => Some("Month must be a whole number".into()),
        WeatherField::Temperature if !(-50.0..=60.0).contains(&n) => {
            Some("Unrealistic temperature (-50 to 60 °C)".into())
        }
        WeatherField::Humidity if !(0.0..=100.0).contains(&n) => {
            Some("Humidity must be 0–100".into())
        }
        WeatherField::Humidity if n.fract() != 0.0 => {
            Some("Humidity must be a whole number".into())
        }
        WeatherField::Wind if n < 0.0 => Some("Wind must be ≥ 0".into()),
        _ => None,
    }
}

/// Parse a finite number, ignoring surrounding whitespace.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Clamp numeric text into `[min, max]`. Empty or non-numeric text is returned unchanged.
pub fn clamp(raw: &str, min: Option<f64>, max: Option<f64>) -> String {
    let Some(mut n) = parse_number(raw) else {
        return raw.to_string();
    };
    if let Some(lo) = min
        && n < lo
    {
        n = lo;
    }
    if let Some(hi) = max
        && n > hi
    {
        n = hi;
    }
    format_number(n)
}

/// Round numeric text to the nearest multiple of `step`, halves rounding up.
///
/// The result carries no more decimals than `step` itself, so `0.1` steps
/// never produce `0.30000000000000004`.
pub fn round_to_step(raw: &str, step: f64) -> String {
    let Some(n) = parse_number(raw) else {
        return raw.to_string();
    };
    if step <= 0.0 {
        return raw.to_string();
    }
    let rounded = (n / step + 0.5).floor() * step;
    let factor = 10f64.powi(step_decimals(step));
    format_number((rounded * factor).round() / factor)
}

fn step_decimals(step: f64) -> i32 {
    let text = format_number(step);
    text.split_once('.')
        .map(|(_, frac)| frac.len() as i32)
        .unwrap_or(0)
}

/// Shortest decimal text: `12` not `12.0`, `0` not `-0`.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(location: &str, month: &str, temp: &str, humidity: &str, wind: &str) -> WeatherForm {
        WeatherForm {
            location: location.into(),
            month: month.into(),
            temperature_c: temp.into(),
            humidity_pct: humidity.into(),
            wind_kmh: wind.into(),
        }
    }

    #[test]
    fn valid_form_builds_query() {
        let q = form(" Colombo ", "8", "29.5", "78", "10").validate().unwrap();
        assert_eq!(
            q,
            WeatherQuery {
                location: "Colombo".into(),
                month: 8,
                temperature_c: 29.5,
                humidity_pct: 78,
                wind_kmh: 10.0,
            }
        );
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = WeatherForm::default().errors();
        let messages: Vec<&str> = errors.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Location is required",
                "Month is required",
                "Temperature is required",
                "Humidity is required",
                "Wind speed is required",
            ]
        );
    }

    #[test]
    fn range_messages() {
        let f = form("Kandy", "13", "61", "101", "-1");
        let errors = f.errors();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], (WeatherField::Month, "Month must be 1–12".into()));
        assert_eq!(
            errors[1],
            (
                WeatherField::Temperature,
                "Unrealistic temperature (-50 to 60 °C)".into()
            )
        );
        assert_eq!(errors[2], (WeatherField::Humidity, "Humidity must be 0–100".into()));
        assert_eq!(errors[3], (WeatherField::Wind, "Wind must be ≥ 0".into()));
    }

    #[test]
    fn non_numeric_and_fractional() {
        let f = form("Galle", "eight", "warm", "55.5", "1,5");
        let errors = f.errors();
        assert_eq!(errors[0].1, "Month must be a number");
        assert_eq!(errors[1].1, "Temperature must be a number");
        assert_eq!(errors[2].1, "Humidity must be a whole number");
        assert_eq!(errors[3].1, "Wind must be a number");
        assert!(!f.is_valid());
    }

    #[test]
    fn infinity_is_not_a_number() {
        let f = form("Galle", "8", "inf", "50", "NaN");
        let errors = f.errors();
        assert_eq!(errors[0].1, "Temperature must be a number");
        assert_eq!(errors[1].1, "Wind must be a number");
    }

    #[test]
    fn validate_joins_messages() {
        let err = form("", "8", "20", "50", "5").validate().unwrap_err();
        assert_eq!(err.to_string(), "Location is required");
    }

    #[test]
    fn blur_clamps_to_bounds() {
        let mut f = form("Colombo", "15", "20", "120", "-3");
        assert!(f.blur(WeatherField::Month));
        assert_eq!(f.month, "12");
        assert!(f.blur(WeatherField::Humidity));
        assert_eq!(f.humidity_pct, "100");
        assert!(f.blur(WeatherField::Wind));
        assert_eq!(f.wind_kmh, "0");
        assert!(!f.blur(WeatherField::Temperature));
        assert_eq!(f.temperature_c, "20");
    }

    #[test]
    fn blur_rounds_to_step() {
        let mut f = form("Colombo", "0", "29.46", "77.5", "10.04");
        f.blur_all();
        assert_eq!(f.month, "1");
        assert_eq!(f.temperature_c, "29.5");
        assert_eq!(f.humidity_pct, "78");
        assert_eq!(f.wind_kmh, "10");
    }

    #[test]
    fn month_is_clamped_but_not_rounded() {
        let mut f = form("Colombo", "3.5", "20", "50", "5");
        assert!(!f.blur(WeatherField::Month));
        assert_eq!(f.month, "3.5");
        assert_eq!(f.validate().unwrap_err().to_string(), "Month must be a whole number");
    }

    #[test]
    fn blur_leaves_text_alone() {
        let mut f = form("Colombo", "", "abc", "", "");
        f.blur_all();
        assert_eq!(f.month, "");
        assert_eq!(f.temperature_c, "abc");
    }

    #[test]
    fn round_to_step_exact_values() {
        assert_eq!(round_to_step("0.25", 0.1), "0.3");
        assert_eq!(round_to_step("0.3", 0.1), "0.3");
        assert_eq!(round_to_step("-0.04", 0.1), "0");
        assert_eq!(round_to_step("-12.35", 0.1), "-12.3");
        assert_eq!(round_to_step("42.5", 1.0), "43");
        assert_eq!(round_to_step("7", 0.0), "7");
    }

    #[test]
    fn clamp_exact_values() {
        assert_eq!(clamp("05", Some(1.0), Some(12.0)), "5");
        assert_eq!(clamp("-7", Some(0.0), None), "0");
        assert_eq!(clamp("7.25", None, None), "7.25");
        assert_eq!(clamp("x", Some(0.0), None), "x");
    }

    #[test]
    fn field_names_match_wire_format() {
        let names: Vec<&str> = WeatherField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            ["location", "month", "temperature_c", "humidity_pct", "wind_kmh"]
        );
        let json = serde_json::to_string(&WeatherField::Humidity).unwrap();
        assert_eq!(json, "\"humidity_pct\"");
    }
}
