use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use super::decimal::Decimal;

/// A decoded field value
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RtValue {
    /// Absent: never read, expired out of the plan, or a sentinel
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    #[serde(serialize_with = "serialize_hex")]
    Bytes(Vec<u8>),
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}

impl RtValue {
    pub fn is_none(&self) -> bool {
        matches!(self, RtValue::None)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RtValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RtValue::Int(i) => Some(*i as f64),
            RtValue::UInt(u) => Some(*u as f64),
            RtValue::Float(f) => Some(*f),
            RtValue::Decimal(d) => Some(d.to_f64()),
            RtValue::None | RtValue::String(_) | RtValue::Bytes(_) => None,
        }
    }
}

impl From<Option<RtValue>> for RtValue {
    fn from(v: Option<RtValue>) -> Self {
        v.unwrap_or(RtValue::None)
    }
}

/// Decoded values of one snapshot, keyed by field name
#[derive(Clone, Debug, Default, Serialize)]
pub struct Record {
    timestamp: i64,
    fields: BTreeMap<String, RtValue>,
}

impl Record {
    pub fn new(timestamp: i64) -> Self {
        Record {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Epoch milliseconds of the snapshot the values came from
    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn set_field(&mut self, key: String, value: RtValue) {
        self.fields.insert(key, value);
    }

    pub fn get_field(&self, key: &str) -> Option<&RtValue> {
        self.fields.get(key)
    }

    pub fn all_fields(&self) -> &BTreeMap<String, RtValue> {
        &self.fields
    }

    /// Fields that have a value
    pub fn present_fields(&self) -> impl Iterator<Item = (&String, &RtValue)> {
        self.fields.iter().filter(|(_, v)| !v.is_none())
    }
}
