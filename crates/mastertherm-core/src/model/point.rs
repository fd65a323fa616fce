// ── Point addressing ──
//
// Every value the heat pump exposes is a "point": a kind tag plus a numeric
// id, rendered on the wire as `D_3`, `I_50`, `A_191`. Only these three
// prefixes belong to the protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use mastertherm_api::{DEFAULT_CONFIG_FILE, DEFAULT_UNIT};

// ── PointKind ───────────────────────────────────────────────────────

/// Wire prefix of a point.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum PointKind {
    /// `D_` -- on/off flag.
    #[strum(serialize = "D")]
    #[serde(rename = "D")]
    Digital,
    /// `I_` -- integer setting or counter.
    #[strum(serialize = "I")]
    #[serde(rename = "I")]
    Integer,
    /// `A_` -- floating point measurement or setpoint.
    #[strum(serialize = "A")]
    #[serde(rename = "A")]
    Analog,
}

// ── PointId ─────────────────────────────────────────────────────────

/// Address of one point inside a device snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PointId {
    pub kind: PointKind,
    pub id: u32,
}

impl PointId {
    pub const fn new(kind: PointKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn digital(id: u32) -> Self {
        Self::new(PointKind::Digital, id)
    }

    pub const fn integer(id: u32) -> Self {
        Self::new(PointKind::Integer, id)
    }

    pub const fn analog(id: u32) -> Self {
        Self::new(PointKind::Analog, id)
    }

    /// Wire field name, e.g. `A_191`.
    pub fn wire_name(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.id)
    }
}

/// Rejected point address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid point '{input}': expected D_<n>, I_<n> or A_<n>")]
pub struct ParsePointError {
    pub input: String,
}

impl FromStr for PointId {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePointError {
            input: s.to_owned(),
        };
        let (prefix, number) = s.split_once('_').ok_or_else(err)?;
        let kind = PointKind::from_str(prefix).map_err(|_| err())?;
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let id = number.parse().map_err(|_| err())?;
        Ok(Self { kind, id })
    }
}

impl TryFrom<String> for PointId {
    type Error = ParsePointError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PointId> for String {
    fn from(point: PointId) -> Self {
        point.to_string()
    }
}

// ── PointValue ──────────────────────────────────────────────────────

/// A decoded point value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Bool(bool),
    Int(i64),
    Analog(f64),
}

impl PointValue {
    pub fn kind(&self) -> PointKind {
        match self {
            Self::Bool(_) => PointKind::Digital,
            Self::Int(_) => PointKind::Integer,
            Self::Analog(_) => PointKind::Analog,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Analog(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Analog(v) => write!(f, "{v}"),
        }
    }
}

/// One entry of an ordered multi-point write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointWrite {
    pub point: PointId,
    pub value: PointValue,
}

impl PointWrite {
    pub fn new(point: PointId, value: PointValue) -> Self {
        Self { point, value }
    }
}

// ── PointLayout ─────────────────────────────────────────────────────

/// Where points live inside the snapshot payload:
/// `data.<config_file>.<unit>.<KIND>_<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointLayout {
    pub config_file: String,
    pub unit: String,
}

impl Default for PointLayout {
    fn default() -> Self {
        Self {
            config_file: DEFAULT_CONFIG_FILE.into(),
            unit: DEFAULT_UNIT.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let point: PointId = "A_191".parse().unwrap();
        assert_eq!(point, PointId::analog(191));
        assert_eq!(point.to_string(), "A_191");
        assert_eq!("D_3".parse::<PointId>().unwrap(), PointId::digital(3));
        assert_eq!("I_50".parse::<PointId>().unwrap(), PointId::integer(50));
    }

    #[test]
    fn rejects_out_of_protocol_prefixes() {
        for bad in ["X_1", "A191", "A_", "a_191", "A_-1", "A_1.5", "A_+1", ""] {
            assert!(bad.parse::<PointId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn serde_uses_wire_name() {
        let json = serde_json::to_string(&PointId::digital(4)).unwrap();
        assert_eq!(json, "\"D_4\"");
        let back: PointId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PointId::digital(4));
        assert!(serde_json::from_str::<PointId>("\"Z_4\"").is_err());
    }

    #[test]
    fn ordering_groups_by_kind() {
        let mut points = vec![
            PointId::analog(3),
            PointId::digital(10),
            PointId::integer(1),
            PointId::digital(2),
        ];
        points.sort();
        assert_eq!(
            points,
            vec![
                PointId::digital(2),
                PointId::digital(10),
                PointId::integer(1),
                PointId::analog(3),
            ]
        );
    }
}
