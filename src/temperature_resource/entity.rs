//! Temperature sensor entity.
//!
//! Reads are slow: every GET waits for `sample_delay` before returning, so the
//! dispatcher answers SLOW and completes the response from another task.

use super::error::TemperatureError;
use crate::framework::ResourceEntity;
use crate::model::Representation;
use async_trait::async_trait;
use std::time::Duration;

pub const TEMPERATURE: &str = "temperature";
pub const UNITS: &str = "units";

/// Drift applied on every notification tick.
pub const TICK_DRIFT: f64 = 0.5;

const SUPPORTED_UNITS: [&str; 3] = ["C", "F", "K"];

#[derive(Debug, Clone, PartialEq)]
pub struct Temperature {
    pub temperature: f64,
    pub units: String,
    sample_delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureCreate {
    pub temperature: f64,
    pub units: String,
    pub sample_delay: Duration,
}

impl Default for TemperatureCreate {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            units: "C".to_string(),
            sample_delay: Duration::from_millis(50),
        }
    }
}

fn check_units(units: &str) -> Result<(), TemperatureError> {
    if SUPPORTED_UNITS.contains(&units) {
        Ok(())
    } else {
        Err(TemperatureError::UnknownUnits(units.to_string()))
    }
}

#[async_trait]
impl ResourceEntity for Temperature {
    type Create = TemperatureCreate;
    type Error = TemperatureError;
    const RESOURCE_TYPE: &'static str = "oic.r.temperature";
    const INTERFACE: &'static str = "oic.if.a";
    const SLOW: bool = true;

    fn from_create_params(_uri: &str, params: TemperatureCreate) -> Result<Self, Self::Error> {
        check_units(&params.units)?;
        Ok(Self {
            temperature: params.temperature,
            units: params.units,
            sample_delay: params.sample_delay,
        })
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(TEMPERATURE, self.temperature)
            .with(UNITS, self.units.as_str())
    }

    async fn on_get(&mut self) -> Result<Representation, Self::Error> {
        tokio::time::sleep(self.sample_delay).await;
        Ok(self.representation())
    }

    async fn on_put(&mut self, representation: &Representation) -> Result<(), Self::Error> {
        let temperature = representation.opt_double(TEMPERATURE)?;
        let units = representation.opt_str(UNITS)?;
        if let Some(units) = units {
            check_units(units)?;
            self.units = units.to_string();
        }
        if let Some(temperature) = temperature {
            self.temperature = temperature;
        }
        Ok(())
    }

    fn on_tick(&mut self) -> Result<(), Self::Error> {
        self.temperature += TICK_DRIFT;
        Ok(())
    }
}
