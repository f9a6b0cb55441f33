//! Declared table schemas for the current-weather transform.
//!
//! [`SCHEMA_IN`] is the shape callers hand to a transform (one string column,
//! `city`), [`SCHEMA_OUT`] is the shape every transform result conforms to.
//! Column order in [`SCHEMA_OUT`] is significant.

use polars::prelude::DataType;
use serde::Serialize;
use std::fmt;
use ColumnType::{Double, Int64, String as Str};

/// Logical column types used by the declared schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int64,
    Double,
}

impl ColumnType {
    /// The Polars dtype a column of this type is materialized as.
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnType::String => DataType::String,
            ColumnType::Int64 => DataType::Int64,
            ColumnType::Double => DataType::Float64,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Int64)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ColumnType::Double)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Int64 => "int64",
            ColumnType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// An ordered list of named, typed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub const fn new(columns: &'static [ColumnSpec]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|spec| spec.name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.column_type)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub const SCHEMA_IN: TableSchema = TableSchema::new(&[ColumnSpec::new("city", Str)]);

pub const SCHEMA_OUT: TableSchema = TableSchema::new(&[
    ColumnSpec::new("city", Str),
    ColumnSpec::new("timestamp", Str),
    ColumnSpec::new("longitude", Double),
    ColumnSpec::new("latitude", Double),
    ColumnSpec::new("country", Str),
    ColumnSpec::new("timezone_offset", Int64),
    ColumnSpec::new("weather_main", Str),
    ColumnSpec::new("weather_description", Str),
    ColumnSpec::new("weather_icon", Str),
    ColumnSpec::new("weather_id", Int64),
    ColumnSpec::new("temp_c", Double),
    ColumnSpec::new("feels_like_c", Double),
    ColumnSpec::new("temp_min_c", Double),
    ColumnSpec::new("temp_max_c", Double),
    ColumnSpec::new("pressure_hpa", Int64),
    ColumnSpec::new("humidity_percent", Int64),
    ColumnSpec::new("sea_level_pressure_hpa", Int64),
    ColumnSpec::new("ground_level_pressure_hpa", Int64),
    ColumnSpec::new("wind_direction_deg", Int64),
    ColumnSpec::new("wind_gust_ms", Int64),
    ColumnSpec::new("clouds_percent", Int64),
    ColumnSpec::new("visibility_m", Int64),
    ColumnSpec::new("data_timestamp", Int64),
    ColumnSpec::new("sunrise_timestamp", Int64),
    ColumnSpec::new("sunset_timestamp", Int64),
    ColumnSpec::new("city_id", Int64),
    ColumnSpec::new("response_code", Int64),
]);
