//! Registrations of the batch adapter as named transforms for the host
//! execution framework.
//!
//! The same adapter is registered twice, once per invocation path the host
//! supports. A registration only pairs the adapter with its declared schemas;
//! calling it forwards the input table unchanged.

use crate::batch::{BatchError, CurrentWeatherBatch};
use crate::schema::{TableSchema, SCHEMA_IN, SCHEMA_OUT};
use log::debug;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Name of the flight-path registration.
pub const FLIGHT_TRANSFORM_NAME: &str = "FetchCurrentWeather";
/// Name of the exchange-path registration.
pub const EXCHANGE_TRANSFORM_NAME: &str = "fetch_current_weather";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("No transform registered under '{0}'")]
    UnknownTransform(String),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// The host-framework invocation path a transform is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Flight,
    Exchange,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformDescription {
    pub name: &'static str,
    pub kind: TransformKind,
    pub schema_in: TableSchema,
    pub schema_out: TableSchema,
}

pub struct RegisteredTransform {
    description: TransformDescription,
    batch: Arc<CurrentWeatherBatch>,
}

impl RegisteredTransform {
    pub fn name(&self) -> &'static str {
        self.description.name
    }

    pub fn kind(&self) -> TransformKind {
        self.description.kind
    }

    pub fn description(&self) -> &TransformDescription {
        &self.description
    }

    pub async fn call(&self, input: &DataFrame) -> Result<DataFrame, TransformError> {
        debug!(
            "Calling transform {} with {} rows",
            self.description.name,
            input.height()
        );
        Ok(self.batch.process(input).await?)
    }
}

#[derive(Default)]
pub struct TransformRegistry {
    transforms: Vec<RegisteredTransform>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `batch` under `name`. A later registration with the same name
    /// replaces the earlier one.
    pub fn register(
        &mut self,
        name: &'static str,
        kind: TransformKind,
        schema_in: TableSchema,
        schema_out: TableSchema,
        batch: Arc<CurrentWeatherBatch>,
    ) {
        self.transforms.retain(|t| t.name() != name);
        self.transforms.push(RegisteredTransform {
            description: TransformDescription {
                name,
                kind,
                schema_in,
                schema_out,
            },
            batch,
        });
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTransform> {
        self.transforms.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTransform> {
        self.transforms.iter()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub async fn call(&self, name: &str, input: &DataFrame) -> Result<DataFrame, TransformError> {
        self.get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))?
            .call(input)
            .await
    }
}

/// Registers the current-weather batch adapter on both invocation paths.
pub fn register_weather_transforms(batch: Arc<CurrentWeatherBatch>) -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry.register(
        FLIGHT_TRANSFORM_NAME,
        TransformKind::Flight,
        SCHEMA_IN,
        SCHEMA_OUT,
        batch.clone(),
    );
    registry.register(
        EXCHANGE_TRANSFORM_NAME,
        TransformKind::Exchange,
        SCHEMA_IN,
        SCHEMA_OUT,
        batch,
    );
    registry
}
