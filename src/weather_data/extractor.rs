//! Flattens a nested OpenWeatherMap "current weather" response into a flat
//! record of named scalar fields.

use crate::weather_data::error::ExtractionError;
use serde_json::{Map, Value};
use std::fmt;
use PathSegment::{Index, Key};

/// A flat mapping from field name to a JSON scalar (string, number or null).
pub type WeatherRecord = Map<String, Value>;

/// One step of a path into the observation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    Key(&'static str),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "key '{}'", key),
            PathSegment::Index(index) => write!(f, "index [{}]", index),
        }
    }
}

/// Output field name and the path it is read from, in output order.
pub const FIELD_PATHS: &[(&str, &[PathSegment])] = &[
    ("longitude", &[Key("coord"), Key("lon")]),
    ("latitude", &[Key("coord"), Key("lat")]),
    ("country", &[Key("sys"), Key("country")]),
    ("timezone_offset", &[Key("timezone")]),
    //
    ("weather_main", &[Key("weather"), Index(0), Key("main")]),
    ("weather_description", &[Key("weather"), Index(0), Key("description")]),
    ("weather_icon", &[Key("weather"), Index(0), Key("icon")]),
    ("weather_id", &[Key("weather"), Index(0), Key("id")]),
    //
    ("temp_c", &[Key("main"), Key("temp")]),
    ("feels_like_c", &[Key("main"), Key("feels_like")]),
    ("temp_min_c", &[Key("main"), Key("temp_min")]),
    ("temp_max_c", &[Key("main"), Key("temp_max")]),
    ("pressure_hpa", &[Key("main"), Key("pressure")]),
    ("humidity_percent", &[Key("main"), Key("humidity")]),
    ("sea_level_pressure_hpa", &[Key("main"), Key("sea_level")]),
    ("ground_level_pressure_hpa", &[Key("main"), Key("grnd_level")]),
    //
    ("wind_direction_deg", &[Key("wind"), Key("deg")]),
    ("wind_gust_ms", &[Key("wind"), Key("gust")]),
    ("clouds_percent", &[Key("clouds"), Key("all")]),
    ("visibility_m", &[Key("visibility")]),
    ("data_timestamp", &[Key("dt")]),
    ("sunset_timestamp", &[Key("sys"), Key("sunset")]),
    ("sunrise_timestamp", &[Key("sys"), Key("sunrise")]),
    ("city_id", &[Key("id")]),
    ("response_code", &[Key("cod")]),
];

/// Extracts every field in [`FIELD_PATHS`] from `observation`.
///
/// A missing key, an out-of-range index or a `null` along the way yields
/// `null` for that field only. Applying a key to something that is not an
/// object (or an index to something that is not an array) is an error.
pub fn extract_record(observation: &Value) -> Result<WeatherRecord, ExtractionError> {
    let mut record = WeatherRecord::new();
    for &(field, path) in FIELD_PATHS {
        record.insert(field.to_string(), get_in(observation, field, path)?);
    }
    Ok(record)
}

fn get_in(
    observation: &Value,
    field: &'static str,
    path: &[PathSegment],
) -> Result<Value, ExtractionError> {
    let mut current = observation;
    for segment in path {
        let next = match (segment, current) {
            (_, Value::Null) => None,
            (Key(key), Value::Object(map)) => map.get(*key),
            (Index(index), Value::Array(items)) => items.get(*index),
            (segment, other) => {
                return Err(ExtractionError::UnexpectedType {
                    field,
                    segment: segment.to_string(),
                    found: json_type_name(other),
                })
            }
        };
        match next {
            Some(value) => current = value,
            None => return Ok(Value::Null),
        }
    }
    Ok(current.clone())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
