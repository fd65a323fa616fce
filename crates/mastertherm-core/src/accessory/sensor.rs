use serde::Serialize;
use strum::Display;

use super::{AccessoryError, current_snapshot};
use crate::codec;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum SensorLocation {
    Indoor,
    Outdoor,
}

impl SensorLocation {
    /// `A_211` indoor, `A_3` outdoor.
    pub fn point(self) -> PointId {
        match self {
            Self::Indoor => PointId::analog(211),
            Self::Outdoor => PointId::analog(3),
        }
    }
}

/// Read-only temperature sensor backed by one analog point.
#[derive(Clone)]
pub struct TemperatureSensor {
    controller: Controller,
    device: DeviceIdentity,
    location: SensorLocation,
}

impl TemperatureSensor {
    pub fn new(controller: Controller, device: &DeviceIdentity, location: SensorLocation) -> Self {
        Self {
            controller,
            device: device.clone(),
            location,
        }
    }

    pub fn location(&self) -> SensorLocation {
        self.location
    }

    pub fn name(&self) -> String {
        format!("{} temperature", self.location)
    }

    pub async fn current_temperature(&self) -> Result<f64, AccessoryError> {
        let snapshot = current_snapshot(&self.controller, &self.device.id).await?;
        codec::decode_analog(&snapshot, self.controller.layout(), self.location.point().id)
            .map_err(|e| {
                AccessoryError::unavailable(
                    &self.device.id,
                    &CoreError::from_codec(&self.device.id, e),
                )
            })
    }
}
