//! Batch adapter: a table of city names in, a table of current-weather rows out.

use crate::schema::{ColumnSpec, ColumnType, TableSchema, SCHEMA_IN, SCHEMA_OUT};
use crate::weather_data::error::FetchError;
use crate::weather_data::extractor::WeatherRecord;
use crate::weather_data::fetcher::CurrentWeatherFetcher;
use log::info;
use polars::prelude::*;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid input table: {0}")]
    InvalidInput(String),

    #[error("Input row {row} has a null city")]
    NullCity { row: usize },

    #[error("Upstream fetch failed for row {row} (city '{city}')")]
    UpstreamFetch {
        row: usize,
        city: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}

/// Runs the single-city fetcher over every row of an input table.
pub struct CurrentWeatherBatch {
    fetcher: CurrentWeatherFetcher,
}

impl CurrentWeatherBatch {
    pub fn new(fetcher: CurrentWeatherFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches the current weather for each `city` in `input`, in row order, and
    /// returns one row per input row conforming to [`SCHEMA_OUT`].
    ///
    /// Rows are fetched one after another. The first failing row aborts the
    /// batch; no partial table is returned.
    pub async fn process(&self, input: &DataFrame) -> Result<DataFrame, BatchError> {
        let cities = input_cities(input)?;
        info!("Fetching current weather for {} cities", cities.len());

        let mut records = Vec::with_capacity(cities.len());
        for (row, city) in cities.into_iter().enumerate() {
            let record = self
                .fetcher
                .fetch(&city)
                .await
                .map_err(|source| BatchError::UpstreamFetch { row, city, source })?;
            records.push(record);
        }

        let frame = records_to_frame(&records)?;
        let conformed = conform_to_schema(&frame, &SCHEMA_OUT)?;
        info!("Built weather table with {} rows", conformed.height());
        Ok(conformed)
    }
}

/// Reads the `city` column of an input table.
pub fn input_cities(input: &DataFrame) -> Result<Vec<String>, BatchError> {
    let name = SCHEMA_IN.columns()[0].name;
    let column = input
        .column(name)
        .map_err(|_| BatchError::InvalidInput(format!("missing column '{}'", name)))?;
    let cities = column.str().map_err(|_| {
        BatchError::InvalidInput(format!(
            "column '{}' must be of type string, found {}",
            name,
            column.dtype()
        ))
    })?;
    cities
        .into_iter()
        .enumerate()
        .map(|(row, city)| city.map(str::to_string).ok_or(BatchError::NullCity { row }))
        .collect()
}

/// Builds a frame with one column per key seen across `records`, in first-seen
/// order. Values absent from a record are null.
pub fn records_to_frame(records: &[WeatherRecord]) -> PolarsResult<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values: Vec<&Value> = records
                .iter()
                .map(|record| record.get(name).unwrap_or(&Value::Null))
                .collect();
            raw_column(name, &values)
        })
        .collect();
    DataFrame::new(columns)
}

/// Picks the narrowest dtype that holds every non-null value: Int64, Float64,
/// Boolean, otherwise String (non-string values rendered as JSON text).
fn raw_column(name: &str, values: &[&Value]) -> Column {
    let name = PlSmallStr::from(name);
    let mut present = values.iter().filter(|v| !v.is_null());

    let series = if present.clone().all(|v| v.is_i64()) {
        Series::new(name, values.iter().map(|v| v.as_i64()).collect::<Vec<_>>())
    } else if present.clone().all(|v| v.is_number()) {
        Series::new(name, values.iter().map(|v| v.as_f64()).collect::<Vec<_>>())
    } else if present.all(|v| v.is_boolean()) {
        Series::new(name, values.iter().map(|v| v.as_bool()).collect::<Vec<_>>())
    } else {
        let text: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name, text)
    };
    Column::from(series)
}

/// Reindexes `frame` to `schema`: declared columns only, in declared order, with
/// all-null columns for any that are missing, each coerced to its declared type.
///
/// Values that cannot be read as the declared numeric type become null.
pub fn conform_to_schema(frame: &DataFrame, schema: &TableSchema) -> PolarsResult<DataFrame> {
    let height = frame.height();
    let columns = schema
        .columns()
        .iter()
        .map(|spec| match frame.column(spec.name) {
            Ok(column) => coerce_column(column, spec),
            Err(_) => Ok(Column::from(Series::full_null(
                spec.name.into(),
                height,
                &spec.column_type.data_type(),
            ))),
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

fn coerce_column(column: &Column, spec: &ColumnSpec) -> PolarsResult<Column> {
    let target = spec.column_type.data_type();
    if column.dtype() == &target {
        return Ok(column.clone());
    }
    if column.dtype() == &DataType::String {
        let name = PlSmallStr::from(spec.name);
        let strings = column.str()?;
        let series = match spec.column_type {
            ColumnType::Int64 => Series::new(
                name,
                strings
                    .into_iter()
                    .map(|v| v.and_then(parse_int))
                    .collect::<Vec<_>>(),
            ),
            ColumnType::Double => Series::new(
                name,
                strings
                    .into_iter()
                    .map(|v| v.and_then(parse_float))
                    .collect::<Vec<_>>(),
            ),
            ColumnType::String => return Ok(column.clone()),
        };
        return Ok(Column::from(series));
    }
    // Numeric and boolean sources: non-strict cast, out-of-range values become null.
    column.cast(&target)
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        parse_float(text)
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}
