//! Indoor and outdoor temperature sensors.

use serde::Serialize;
use tabled::Tabled;

use mastertherm_core::{Controller, SensorLocation, TemperatureSensor};

use crate::cli::{GlobalOpts, ModuleArg};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct SensorReading {
    location: String,
    name: String,
    celsius: f64,
}

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "Temperature")]
    temperature: String,
}

impl From<&SensorReading> for SensorRow {
    fn from(r: &SensorReading) -> Self {
        Self {
            name: r.name.clone(),
            temperature: output::celsius(Some(r.celsius)),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: ModuleArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ModuleArg { module } = args;
    let device = util::resolve_module(controller, &module)?;

    let mut readings = Vec::with_capacity(2);
    for location in [SensorLocation::Indoor, SensorLocation::Outdoor] {
        let sensor = TemperatureSensor::new(controller.clone(), &device, location);
        readings.push(SensorReading {
            location: location.to_string(),
            name: sensor.name(),
            celsius: sensor.current_temperature().await?,
        });
    }

    let out = output::render_list(
        &global.output,
        &readings,
        |r| SensorRow::from(r),
        |r| format!("{}\t{:.1}", r.location, r.celsius),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
