use serde::Serialize;
use tracing::debug;

use super::{AccessoryError, HeatingCoolingState, TemperatureDisplayUnits, current_snapshot};
use crate::codec::{self, CodecError};
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, PointId, PointLayout, PointValue, PointWrite, Snapshot};

/// `D_3`: heat pump enabled.
pub const ENABLED: u32 = 3;
/// `D_4`: cooling currently active.
pub const COOLING_ACTIVE: u32 = 4;
/// `I_50`: operating mode (0 auto, 1 heat, 2 cool).
pub const OPERATING_MODE: u32 = 50;
/// `A_211`: indoor temperature.
pub const INDOOR_TEMPERATURE: u32 = 211;
/// `A_191`: heating setpoint.
pub const TARGET_TEMPERATURE: u32 = 191;

/// Main heat-pump thermostat of a module.
#[derive(Clone)]
pub struct HeatPumpThermostat {
    controller: Controller,
    device: DeviceIdentity,
}

/// Everything the thermostat exposes, decoded from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ThermostatStatus {
    pub device_id: String,
    pub name: String,
    pub current_state: HeatingCoolingState,
    pub target_state: HeatingCoolingState,
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub units: TemperatureDisplayUnits,
}

impl HeatPumpThermostat {
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

    pub async fn target_state(&self) -> Result<HeatingCoolingState, AccessoryError> {
        self.read(target_state).await
    }

    pub async fn current_temperature(&self) -> Result<f64, AccessoryError> {
        self.read(|s, l| codec::decode_analog(s, l, INDOOR_TEMPERATURE))
            .await
    }

    pub async fn target_temperature(&self) -> Result<f64, AccessoryError> {
        self.read(|s, l| codec::decode_analog(s, l, TARGET_TEMPERATURE))
            .await
    }

    pub async fn status(&self) -> Result<ThermostatStatus, AccessoryError> {
        self.read(|s, l| {
            Ok(ThermostatStatus {
                device_id: self.device.id.clone(),
                name: self.device.name.clone(),
                current_state: current_state(s, l)?,
                target_state: target_state(s, l)?,
                current_temperature: codec::decode_analog(s, l, INDOOR_TEMPERATURE)?,
                target_temperature: codec::decode_analog(s, l, TARGET_TEMPERATURE)?,
                units: TemperatureDisplayUnits::Celsius,
            })
        })
        .await
    }

    /// Switch the heat pump off, or on in the given mode.
    ///
    /// Turning on writes the enable bit first, then the mode selector.
    pub async fn set_target_state(&self, state: HeatingCoolingState) -> Result<(), AccessoryError> {
        debug!(device_id = %self.device.id, %state, "set target state");
        self.write(target_state_writes(state)).await
    }

    pub async fn set_target_temperature(&self, celsius: f64) -> Result<(), AccessoryError> {
        if !celsius.is_finite() {
            return Err(AccessoryError::InvalidValue {
                message: format!("{celsius} is not a temperature"),
            });
        }
        debug!(device_id = %self.device.id, celsius, "set target temperature");
        self.write(vec![PointWrite::new(
            PointId::analog(TARGET_TEMPERATURE),
            PointValue::Analog(celsius),
        )])
        .await
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

    async fn write(&self, writes: Vec<PointWrite>) -> Result<(), AccessoryError> {
        self.controller
            .write_points(&self.device.id, writes)
            .await
            .map_err(|e| AccessoryError::unavailable(&self.device.id, &e))
    }
}

/// Off when disabled; otherwise cooling or heating per `D_4`.
pub fn current_state(
    snapshot: &Snapshot,
    layout: &PointLayout,
) -> Result<HeatingCoolingState, CodecError> {
    if !codec::decode_bool(snapshot, layout, ENABLED)? {
        return Ok(HeatingCoolingState::Off);
    }
    if codec::decode_bool(snapshot, layout, COOLING_ACTIVE)? {
        Ok(HeatingCoolingState::Cool)
    } else {
        Ok(HeatingCoolingState::Heat)
    }
}

/// Off when disabled; otherwise the operating mode, unknown modes read as auto.
pub fn target_state(
    snapshot: &Snapshot,
    layout: &PointLayout,
) -> Result<HeatingCoolingState, CodecError> {
    if !codec::decode_bool(snapshot, layout, ENABLED)? {
        return Ok(HeatingCoolingState::Off);
    }
    Ok(match codec::decode_int(snapshot, layout, OPERATING_MODE)? {
        1 => HeatingCoolingState::Heat,
        2 => HeatingCoolingState::Cool,
        _ => HeatingCoolingState::Auto,
    })
}

/// Point writes for a target state, in the order they must be issued.
///
/// Multi-mode mapping: auto/heat/cool select `I_50` after enabling `D_3`.
/// A plain on/off thermostat would toggle `D_3` alone and offer only Off and Heat.
pub fn target_state_writes(state: HeatingCoolingState) -> Vec<PointWrite> {
    let enabled = PointId::digital(ENABLED);
    let mode = PointId::integer(OPERATING_MODE);
    match state {
        HeatingCoolingState::Off => vec![PointWrite::new(enabled, PointValue::Bool(false))],
        HeatingCoolingState::Auto => vec![
            PointWrite::new(enabled, PointValue::Bool(true)),
            PointWrite::new(mode, PointValue::Int(0)),
        ],
        HeatingCoolingState::Heat => vec![
            PointWrite::new(enabled, PointValue::Bool(true)),
            PointWrite::new(mode, PointValue::Int(1)),
        ],
        HeatingCoolingState::Cool => vec![
            PointWrite::new(enabled, PointValue::Bool(true)),
            PointWrite::new(mode, PointValue::Int(2)),
        ],
    }
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
    fn disabled_pump_is_off() {
        let snap = snapshot(json!({ "D_3": "0", "D_4": "1", "I_50": "2" }));
        let layout = PointLayout::default();
        assert_eq!(current_state(&snap, &layout).unwrap(), HeatingCoolingState::Off);
        assert_eq!(target_state(&snap, &layout).unwrap(), HeatingCoolingState::Off);
    }

    #[test]
    fn enabled_pump_follows_cooling_flag() {
        let layout = PointLayout::default();
        let cooling = snapshot(json!({ "D_3": "1", "D_4": "1" }));
        let heating = snapshot(json!({ "D_3": "1", "D_4": "0" }));
        assert_eq!(current_state(&cooling, &layout).unwrap(), HeatingCoolingState::Cool);
        assert_eq!(current_state(&heating, &layout).unwrap(), HeatingCoolingState::Heat);
    }

    #[test]
    fn target_state_from_operating_mode() {
        let layout = PointLayout::default();
        let cases = [
            ("0", HeatingCoolingState::Auto),
            ("1", HeatingCoolingState::Heat),
            ("2", HeatingCoolingState::Cool),
            ("7", HeatingCoolingState::Auto),
        ];
        for (mode, expected) in cases {
            let snap = snapshot(json!({ "D_3": "1", "I_50": mode }));
            assert_eq!(target_state(&snap, &layout).unwrap(), expected, "mode {mode}");
        }
    }

    #[test]
    fn missing_enable_bit_is_an_error() {
        let snap = snapshot(json!({ "I_50": "1" }));
        assert!(matches!(
            current_state(&snap, &PointLayout::default()),
            Err(CodecError::PointNotFound { .. })
        ));
    }

    #[test]
    fn turning_on_writes_enable_before_mode() {
        let writes = target_state_writes(HeatingCoolingState::Cool);
        assert_eq!(
            writes,
            vec![
                PointWrite::new(PointId::digital(3), PointValue::Bool(true)),
                PointWrite::new(PointId::integer(50), PointValue::Int(2)),
            ]
        );
        assert_eq!(
            target_state_writes(HeatingCoolingState::Off),
            vec![PointWrite::new(PointId::digital(3), PointValue::Bool(false))]
        );
    }
}
