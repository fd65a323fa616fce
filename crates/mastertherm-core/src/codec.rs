// ── Point value codec ──
//
// Pure mapping between typed point values and the service's string-keyed
// payload. Nothing here touches the network or the cache; callers decide
// whether a decode failure becomes a stale read or a user-facing error.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::model::{PointId, PointKind, PointLayout, PointValue, Snapshot};

/// Decode/encode failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The key, or the nested path leading to it, is absent.
    #[error("point {point} not found in snapshot")]
    PointNotFound { point: PointId },

    /// The key exists but its value does not fit the point's kind.
    #[error("point {point} has malformed value {raw}")]
    MalformedValue { point: PointId, raw: String },

    /// A write value whose type does not match the point's kind.
    #[error("cannot write {value_kind} value to {point}")]
    KindMismatch {
        point: PointId,
        value_kind: PointKind,
    },
}

/// Request body fragment for a single point write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFragment {
    pub variable_id: String,
    pub variable_value: String,
}

// ── Decode ──────────────────────────────────────────────────────────

/// Read one typed point out of a snapshot.
pub fn decode(
    snapshot: &Snapshot,
    layout: &PointLayout,
    point: PointId,
) -> Result<PointValue, CodecError> {
    let raw = unit_map(&snapshot.data, layout)
        .and_then(|unit| unit.get(&point.wire_name()))
        .ok_or(CodecError::PointNotFound { point })?;
    decode_value(point, raw)
}

pub fn decode_bool(snapshot: &Snapshot, layout: &PointLayout, id: u32) -> Result<bool, CodecError> {
    let point = PointId::digital(id);
    match decode(snapshot, layout, point)? {
        PointValue::Bool(b) => Ok(b),
        other => Err(CodecError::MalformedValue {
            point,
            raw: other.to_string(),
        }),
    }
}

pub fn decode_int(snapshot: &Snapshot, layout: &PointLayout, id: u32) -> Result<i64, CodecError> {
    let point = PointId::integer(id);
    match decode(snapshot, layout, point)? {
        PointValue::Int(i) => Ok(i),
        other => Err(CodecError::MalformedValue {
            point,
            raw: other.to_string(),
        }),
    }
}

pub fn decode_analog(
    snapshot: &Snapshot,
    layout: &PointLayout,
    id: u32,
) -> Result<f64, CodecError> {
    let point = PointId::analog(id);
    match decode(snapshot, layout, point)? {
        PointValue::Analog(f) => Ok(f),
        other => Err(CodecError::MalformedValue {
            point,
            raw: other.to_string(),
        }),
    }
}

/// Every in-protocol point of a snapshot, ordered by kind then id.
///
/// Keys outside the `D_`/`I_`/`A_` prefixes and values that do not decode
/// are skipped.
pub fn points(snapshot: &Snapshot, layout: &PointLayout) -> BTreeMap<PointId, PointValue> {
    let Some(unit) = unit_map(&snapshot.data, layout) else {
        return BTreeMap::new();
    };

    unit.iter()
        .filter_map(|(key, raw)| {
            let point: PointId = key.parse().ok()?;
            match decode_value(point, raw) {
                Ok(value) => Some((point, value)),
                Err(e) => {
                    trace!(error = %e, "skipping undecodable point");
                    None
                }
            }
        })
        .collect()
}

/// Interpret a user-supplied string as a value for `point`.
pub fn parse_value(point: PointId, input: &str) -> Result<PointValue, CodecError> {
    decode_value(point, &Value::String(input.trim().to_owned()))
}

/// Resolve `data.<config_file>.<unit>`.
///
/// When the configured config-file key is absent but the payload carries
/// exactly one config-file entry, that entry is used.
fn unit_map<'a>(
    data: &'a Value,
    layout: &PointLayout,
) -> Option<&'a serde_json::Map<String, Value>> {
    let files = data.as_object()?;
    let file = match files.get(&layout.config_file) {
        Some(file) => file,
        None if files.len() == 1 => files.values().next()?,
        None => return None,
    };
    file.get(&layout.unit)?.as_object()
}

fn decode_value(point: PointId, raw: &Value) -> Result<PointValue, CodecError> {
    let malformed = || CodecError::MalformedValue {
        point,
        raw: raw.to_string(),
    };

    match point.kind {
        PointKind::Digital => match raw {
            Value::Bool(b) => Ok(PointValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(|i| i != 0)
                .or_else(|| n.as_f64().map(|f| f.abs() > 0.0))
                .map(PointValue::Bool)
                .ok_or_else(malformed),
            Value::String(s) => match s.trim() {
                "1" | "true" | "TRUE" | "True" => Ok(PointValue::Bool(true)),
                "0" | "false" | "FALSE" | "False" => Ok(PointValue::Bool(false)),
                _ => Err(malformed()),
            },
            _ => Err(malformed()),
        },
        PointKind::Integer => match raw {
            Value::Number(n) => n.as_i64().map(PointValue::Int).ok_or_else(malformed),
            Value::String(s) => s
                .trim()
                .parse()
                .map(PointValue::Int)
                .map_err(|_| malformed()),
            _ => Err(malformed()),
        },
        PointKind::Analog => match raw {
            Value::Number(n) => n.as_f64().map(PointValue::Analog).ok_or_else(malformed),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(PointValue::Analog)
                .ok_or_else(malformed),
            _ => Err(malformed()),
        },
    }
}

// ── Encode ──────────────────────────────────────────────────────────

/// Build the `variableId`/`variableValue` pair for a write.
///
/// Booleans become `1`/`0`; analog values use the shortest decimal form.
pub fn encode(point: PointId, value: PointValue) -> Result<WriteFragment, CodecError> {
    let variable_value = match (point.kind, value) {
        (PointKind::Digital, PointValue::Bool(b)) => String::from(if b { "1" } else { "0" }),
        (PointKind::Integer, PointValue::Int(i)) => i.to_string(),
        (PointKind::Analog, PointValue::Analog(f)) if f.is_finite() => f.to_string(),
        (PointKind::Analog, PointValue::Analog(f)) => {
            return Err(CodecError::MalformedValue {
                point,
                raw: f.to_string(),
            });
        }
        (_, other) => {
            return Err(CodecError::KindMismatch {
                point,
                value_kind: other.kind(),
            });
        }
    };

    Ok(WriteFragment {
        variable_id: point.wire_name(),
        variable_value,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn snapshot(data: Value) -> Snapshot {
        Snapshot {
            device_id: "42".into(),
            vendor_timestamp: None,
            fetched_at: Utc::now(),
            message_id: 1,
            data,
        }
    }

    fn vendor_snapshot(points: Value) -> Snapshot {
        snapshot(json!({ "varfile_mt1_config1": { "001": points } }))
    }

    #[test]
    fn decodes_each_kind_from_strings() {
        let snap = vendor_snapshot(json!({ "D_3": "1", "I_50": "2", "A_191": "21.5" }));
        let layout = PointLayout::default();

        assert!(decode_bool(&snap, &layout, 3).unwrap());
        assert_eq!(decode_int(&snap, &layout, 50).unwrap(), 2);
        assert!((decode_analog(&snap, &layout, 191).unwrap() - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn decodes_native_json_scalars() {
        let snap = vendor_snapshot(json!({ "D_3": true, "D_4": 0, "I_50": 1, "A_3": -4 }));
        let layout = PointLayout::default();

        assert!(decode_bool(&snap, &layout, 3).unwrap());
        assert!(!decode_bool(&snap, &layout, 4).unwrap());
        assert_eq!(decode_int(&snap, &layout, 50).unwrap(), 1);
        assert_eq!(
            decode(&snap, &layout, PointId::analog(3)).unwrap(),
            PointValue::Analog(-4.0)
        );
    }

    #[test]
    fn single_config_file_is_used_when_key_differs() {
        let snap = snapshot(json!({ "cfg": { "001": { "D_3": true, "A_191": 21.5 } } }));
        let layout = PointLayout::default();

        assert!(decode_bool(&snap, &layout, 3).unwrap());
        assert!((decode_analog(&snap, &layout, 191).unwrap() - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_key_or_path_is_point_not_found() {
        let layout = PointLayout::default();
        let point = PointId::analog(191);

        let cases = [
            vendor_snapshot(json!({ "A_3": "1.0" })),
            snapshot(json!({ "varfile_mt1_config1": { "002": {} } })),
            snapshot(json!({ "a": {}, "b": {} })),
            snapshot(Value::Null),
            snapshot(json!({ "varfile_mt1_config1": "oops" })),
        ];

        for snap in &cases {
            assert_eq!(
                decode(snap, &layout, point),
                Err(CodecError::PointNotFound { point }),
                "payload {}",
                snap.data
            );
        }
    }

    #[test]
    fn wrong_shape_is_malformed_not_coerced() {
        let snap = vendor_snapshot(json!({ "D_3": "maybe", "I_50": "2.5", "A_1": "warm", "A_2": null }));
        let layout = PointLayout::default();

        assert!(matches!(
            decode_bool(&snap, &layout, 3),
            Err(CodecError::MalformedValue { .. })
        ));
        assert!(matches!(
            decode_int(&snap, &layout, 50),
            Err(CodecError::MalformedValue { .. })
        ));
        assert!(matches!(
            decode_analog(&snap, &layout, 1),
            Err(CodecError::MalformedValue { .. })
        ));
        assert!(matches!(
            decode_analog(&snap, &layout, 2),
            Err(CodecError::MalformedValue { .. })
        ));
    }

    #[test]
    fn encode_wire_forms() {
        let frag = encode(PointId::analog(191), PointValue::Analog(22.0)).unwrap();
        assert_eq!(frag.variable_id, "A_191");
        assert_eq!(frag.variable_value, "22");

        assert_eq!(
            encode(PointId::analog(191), PointValue::Analog(21.5))
                .unwrap()
                .variable_value,
            "21.5"
        );
        assert_eq!(
            encode(PointId::digital(3), PointValue::Bool(false))
                .unwrap()
                .variable_value,
            "0"
        );
        assert_eq!(
            encode(PointId::integer(50), PointValue::Int(2))
                .unwrap()
                .variable_value,
            "2"
        );
    }

    #[test]
    fn encode_rejects_kind_mismatch_and_non_finite() {
        assert_eq!(
            encode(PointId::digital(3), PointValue::Analog(1.0)),
            Err(CodecError::KindMismatch {
                point: PointId::digital(3),
                value_kind: PointKind::Analog,
            })
        );
        assert!(matches!(
            encode(PointId::analog(1), PointValue::Analog(f64::NAN)),
            Err(CodecError::MalformedValue { .. })
        ));
    }

    #[test]
    fn encoded_values_decode_back() {
        let cases = [
            (PointId::digital(3), PointValue::Bool(true)),
            (PointId::digital(4), PointValue::Bool(false)),
            (PointId::integer(50), PointValue::Int(-7)),
            (PointId::integer(51), PointValue::Int(i64::MAX)),
            (PointId::analog(191), PointValue::Analog(22.0)),
            (PointId::analog(192), PointValue::Analog(-0.125)),
            (PointId::analog(193), PointValue::Analog(1e-7)),
        ];

        for (point, value) in cases {
            let frag = encode(point, value).unwrap();
            let mut unit = serde_json::Map::new();
            unit.insert(frag.variable_id, Value::String(frag.variable_value));
            let snap = vendor_snapshot(Value::Object(unit));
            assert_eq!(decode(&snap, &PointLayout::default(), point).unwrap(), value);
        }
    }

    #[test]
    fn points_lists_only_protocol_keys() {
        let snap = vendor_snapshot(json!({
            "A_3": "4.5",
            "D_3": "1",
            "I_50": "0",
            "SOMETHING": "x",
            "A_9": "n/a"
        }));

        let all = points(&snap, &PointLayout::default());
        let keys: Vec<String> = all.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["D_3", "I_50", "A_3"]);
    }

    #[test]
    fn parse_user_input() {
        assert_eq!(
            parse_value(PointId::digital(3), " true ").unwrap(),
            PointValue::Bool(true)
        );
        assert_eq!(
            parse_value(PointId::analog(191), "22").unwrap(),
            PointValue::Analog(22.0)
        );
        assert!(parse_value(PointId::integer(50), "two").is_err());
    }
}
