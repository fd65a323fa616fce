use serde::Serialize;
use tracing::debug;

use super::{AccessoryError, HeatingCoolingState, TemperatureDisplayUnits, current_snapshot};
use crate::codec::{self, CodecError};
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, PointId, PointLayout, PointValue, Snapshot};

/// `D_3`: heat pump enabled (the boiler has no switch of its own).
pub const ENABLED: u32 = 3;
/// `A_126`: hot water temperature.
pub const CURRENT_TEMPERATURE: u32 = 126;
/// `A_129`: hot water setpoint.
pub const TARGET_TEMPERATURE: u32 = 129;
/// `A_296`: lowest accepted setpoint.
pub const MIN_TARGET: u32 = 296;
/// `A_297`: highest accepted setpoint.
pub const MAX_TARGET: u32 = 297;

/// Domestic hot water thermostat of a module.
///
/// The mode is not controllable: the target state is always `Auto`.
#[derive(Clone)]
pub struct HotWaterThermostat {
    controller: Controller,
    device: DeviceIdentity,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotWaterStatus {
    pub device_id: String,
    pub name: String,
    pub current_state: HeatingCoolingState,
    pub target_state: HeatingCoolingState,
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub min_target: Option<f64>,
    pub max_target: Option<f64>,
    pub units: TemperatureDisplayUnits,
}

impl HotWaterThermostat {
    pub fn new(controller: Controller, device: &DeviceIdentity) -> Self {
        Self {
            controller,
            device: device.clone(),
        }
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn display_units(&self) -> TemperatureDisplayUnits {
        TemperatureDisplayUnits::Celsius
    }

    pub async fn current_state(&self) -> Result<HeatingCoolingState, AccessoryError> {
        self.read(current_state).await
    }

    pub fn target_state(&self) -> HeatingCoolingState {
        HeatingCoolingState::Auto
    }

    /// Only `Auto` is accepted, and it changes nothing.
    pub fn set_target_state(&self, state: HeatingCoolingState) -> Result<(), AccessoryError> {
        match state {
            HeatingCoolingState::Auto => Ok(()),
            other => Err(AccessoryError::InvalidValue {
                message: format!("hot water only supports auto, not {other}"),
            }),
        }
    }

    pub async fn current_temperature(&self) -> Result<f64, AccessoryError> {
        self.read(|s, l| codec::decode_analog(s, l, CURRENT_TEMPERATURE))
            .await
    }

    pub async fn target_temperature(&self) -> Result<f64, AccessoryError> {
        self.read(|s, l| codec::decode_analog(s, l, TARGET_TEMPERATURE))
            .await
    }

    /// Accepted setpoint range, when the module reports one.
    pub async fn target_range(&self) -> Result<Option<(f64, f64)>, AccessoryError> {
        self.read(|s, l| Ok(target_range(s, l))).await
    }

    pub async fn status(&self) -> Result<HotWaterStatus, AccessoryError> {
        self.read(|s, l| {
            let range = target_range(s, l);
            Ok(HotWaterStatus {
                device_id: self.device.id.clone(),
                name: self.device.name.clone(),
                current_state: current_state(s, l)?,
                target_state: HeatingCoolingState::Auto,
                current_temperature: codec::decode_analog(s, l, CURRENT_TEMPERATURE)?,
                target_temperature: codec::decode_analog(s, l, TARGET_TEMPERATURE)?,
                min_target: range.map(|(min, _)| min),
                max_target: range.map(|(_, max)| max),
                units: TemperatureDisplayUnits::Celsius,
            })
        })
        .await
    }

    /// Write the setpoint, rejecting values outside the reported range.
    pub async fn set_target_temperature(&self, celsius: f64) -> Result<(), AccessoryError> {
        if !celsius.is_finite() {
            return Err(AccessoryError::InvalidValue {
                message: format!("{celsius} is not a temperature"),
            });
        }
        if let Some((min, max)) = self
            .target_range()
            .await?
            .filter(|&(min, max)| celsius < min || celsius > max)
        {
            return Err(AccessoryError::InvalidValue {
                message: format!("{celsius} outside accepted range {min}..={max}"),
            });
        }

        debug!(device_id = %self.device.id, celsius, "set hot water target");
        self.controller
            .write_point(
                &self.device.id,
                PointId::analog(TARGET_TEMPERATURE),
                PointValue::Analog(celsius),
            )
            .await
            .map_err(|e| AccessoryError::unavailable(&self.device.id, &e))
    }

    async fn read<T>(
        &self,
        decode: impl FnOnce(&Snapshot, &PointLayout) -> Result<T, CodecError>,
    ) -> Result<T, AccessoryError> {
        let snapshot = current_snapshot(&self.controller, &self.device.id).await?;
        decode(&snapshot, self.controller.layout()).map_err(|e| {
            AccessoryError::unavailable(&self.device.id, &CoreError::from_codec(&self.device.id, e))
        })
    }
}

/// Heating while the pump is enabled, off otherwise.
pub fn current_state(
    snapshot: &Snapshot,
    layout: &PointLayout,
) -> Result<HeatingCoolingState, CodecError> {
    if codec::decode_bool(snapshot, layout, ENABLED)? {
        Ok(HeatingCoolingState::Heat)
    } else {
        Ok(HeatingCoolingState::Off)
    }
}

/// `(min, max)` setpoint bounds, if both are present and ordered.
pub fn target_range(snapshot: &Snapshot, layout: &PointLayout) -> Option<(f64, f64)> {
    let min = codec::decode_analog(snapshot, layout, MIN_TARGET).ok()?;
    let max = codec::decode_analog(snapshot, layout, MAX_TARGET).ok()?;
    (min <= max).then_some((min, max))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{Value, json};

    fn snapshot(points: Value) -> Snapshot {
        Snapshot {
            device_id: "42".into(),
            vendor_timestamp: None,
            fetched_at: Utc::now(),
            message_id: 1,
            data: json!({ "varfile_mt1_config1": { "001": points } }),
        }
    }

    #[test]
    fn state_follows_enable_bit() {
        let layout = PointLayout::default();
        assert_eq!(
            current_state(&snapshot(json!({ "D_3": "1" })), &layout).unwrap(),
            HeatingCoolingState::Heat
        );
        assert_eq!(
            current_state(&snapshot(json!({ "D_3": "0" })), &layout).unwrap(),
            HeatingCoolingState::Off
        );
    }

    #[test]
    fn range_requires_both_bounds() {
        let layout = PointLayout::default();
        assert_eq!(
            target_range(&snapshot(json!({ "A_296": "40", "A_297": "55" })), &layout),
            Some((40.0, 55.0))
        );
        assert_eq!(target_range(&snapshot(json!({ "A_296": "40" })), &layout), None);
        assert_eq!(
            target_range(&snapshot(json!({ "A_296": "60", "A_297": "55" })), &layout),
            None
        );
    }
}
