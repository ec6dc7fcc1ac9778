//! JSON driver documents
//!
//! A driver document declares the fields of a device family as a map of field
//! name to field options. Options set under `common` apply to every field and
//! are overridden by the field's own options.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_mgmt::{
    read_fixed_scale, read_value, DecodeError, DecodeOptions, Record, RtValue, WordOrder,
};
use crate::registers::{
    DataType, DeviceFamily, ReadFunction, ReadGroup, ReferenceDescriptor, RegisterTable, Snapshot,
};

/// Name prefixes of configuration fields when a driver declares no groups
const DEFAULT_CONFIG_PREFIXES: [&str; 2] = ["Info", "Config"];

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid driver JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Field '{0}' has no register")]
    MissingRegister(String),
    #[error("Field '{0}' has no datatype")]
    MissingDatatype(String),
    #[error("Field '{field}' has unsupported function code {code}")]
    UnknownFunctionCode { field: String, code: u8 },
    #[error("Field '{field}' of type {datatype} needs an explicit word count")]
    MissingWords { field: String, datatype: DataType },
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FieldOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fncode: Option<u8>,
    /// Implied fractional digits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Treat the type's sentinel value as not available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Merge source options into target, with source taking precedence
fn merge_field_opts(target: &mut FieldOpts, source: &FieldOpts) {
    if let Some(register) = source.register {
        target.register = Some(register);
    }
    if let Some(words) = source.words {
        target.words = Some(words);
    }
    if let Some(datatype) = source.datatype {
        target.datatype = Some(datatype);
    }
    if let Some(fncode) = source.fncode {
        target.fncode = Some(fncode);
    }
    if let Some(scale) = source.scale {
        target.scale = Some(scale);
    }
    if let Some(nan) = source.nan {
        target.nan = Some(nan);
    }
    if let Some(ref unit) = source.unit {
        target.unit = Some(unit.clone());
    }
    if let Some(ref description) = source.description {
        target.description = Some(description.clone());
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Groups {
    #[serde(default)]
    pub config: Vec<String>,
    #[serde(default)]
    pub runtime: Vec<String>,
}

/// A driver document as written
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DriverSchema {
    pub name: String,
    #[serde(default)]
    pub order: WordOrder,
    #[serde(default)]
    pub common: FieldOpts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Groups>,
    pub fields: BTreeMap<String, FieldOpts>,
}

/// Resolve a field by merging common and field-specific settings
pub fn resolve_field_definition(driver: &DriverSchema, field_name: &str) -> Option<FieldOpts> {
    let field_def = driver.fields.get(field_name)?;
    let mut resolved = FieldOpts::default();
    merge_field_opts(&mut resolved, &driver.common);
    merge_field_opts(&mut resolved, field_def);
    Some(resolved)
}

fn descriptor_for(name: &str, opts: &FieldOpts) -> Result<ReferenceDescriptor, DriverError> {
    let address = opts
        .register
        .ok_or_else(|| DriverError::MissingRegister(name.to_string()))?;
    let data_type = opts
        .datatype
        .ok_or_else(|| DriverError::MissingDatatype(name.to_string()))?;
    let code = opts.fncode.unwrap_or(ReadFunction::default().code());
    let function = ReadFunction::for_code(code).ok_or_else(|| DriverError::UnknownFunctionCode {
        field: name.to_string(),
        code,
    })?;
    let word_length = opts.words.unwrap_or(0);
    if word_length == 0 && data_type.word_length() == 0 {
        return Err(DriverError::MissingWords {
            field: name.to_string(),
            datatype: data_type,
        });
    }
    Ok(ReferenceDescriptor {
        name: Cow::Owned(name.to_string()),
        address,
        word_length,
        data_type,
        function,
    })
}

/// A validated driver, usable as a device family
#[derive(Clone, Debug)]
pub struct JsonDriver {
    schema: DriverSchema,
    /// Sorted by address, then name
    descriptors: Vec<ReferenceDescriptor>,
    resolved: BTreeMap<String, FieldOpts>,
}

impl JsonDriver {
    pub fn from_schema(schema: DriverSchema) -> Result<Self, DriverError> {
        let mut descriptors = Vec::with_capacity(schema.fields.len());
        let mut resolved = BTreeMap::new();
        for name in schema.fields.keys() {
            if let Some(opts) = resolve_field_definition(&schema, name) {
                descriptors.push(descriptor_for(name, &opts)?);
                resolved.insert(name.clone(), opts);
            }
        }
        descriptors.sort_by(|a, b| (a.address, &a.name).cmp(&(b.address, &b.name)));
        Ok(JsonDriver {
            schema,
            descriptors,
            resolved,
        })
    }

    /// Load a driver document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read driver file {}: {}", path.display(), e))?;
        let driver = content
            .parse::<JsonDriver>()
            .map_err(|e| anyhow!("Failed to load driver {}: {}", path.display(), e))?;
        log::debug!(
            "Loaded driver '{}' with {} fields from {}",
            driver.name(),
            driver.descriptors.len(),
            path.display()
        );
        Ok(driver)
    }

    pub fn schema(&self) -> &DriverSchema {
        &self.schema
    }

    pub fn field_opts(&self, name: &str) -> Option<&FieldOpts> {
        self.resolved.get(name)
    }

    /// Decode one field, applying its scale and sentinel options
    pub fn read_field(
        &self,
        snapshot: &Snapshot,
        descriptor: &ReferenceDescriptor,
        trim: bool,
    ) -> Result<Option<RtValue>, DecodeError> {
        let opts = self.field_opts(descriptor.name());
        let decode_opts = DecodeOptions {
            order: self.schema.order,
            trim,
            not_a_number: opts.and_then(|o| o.nan).unwrap_or(false),
        };
        match opts.and_then(|o| o.scale) {
            Some(scale) if descriptor.data_type.is_integer() => {
                Ok(read_fixed_scale(snapshot, descriptor, &decode_opts, scale)?.map(RtValue::Decimal))
            }
            _ => read_value(snapshot, descriptor, &decode_opts),
        }
    }

    /// Decode every field of the driver
    pub fn read_record(&self, snapshot: &Snapshot) -> Result<Record, DecodeError> {
        let mut record = Record::new(snapshot.timestamp());
        for descriptor in &self.descriptors {
            let value = self.read_field(snapshot, descriptor, true)?;
            record.set_field(descriptor.name().to_string(), value.into());
        }
        Ok(record)
    }
}

impl FromStr for JsonDriver {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let schema: DriverSchema = serde_json::from_str(s)?;
        JsonDriver::from_schema(schema)
    }
}

impl DeviceFamily for JsonDriver {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn registers(&self) -> RegisterTable<'_> {
        RegisterTable::new(&self.descriptors)
    }

    fn word_order(&self) -> WordOrder {
        self.schema.order
    }

    fn group_of(&self, reference: &ReferenceDescriptor) -> Option<ReadGroup> {
        match &self.schema.groups {
            Some(groups) => {
                if reference.has_prefix(&groups.config) {
                    Some(ReadGroup::Config)
                } else if reference.has_prefix(&groups.runtime) {
                    Some(ReadGroup::Runtime)
                } else {
                    None
                }
            }
            None if reference.has_prefix(&DEFAULT_CONFIG_PREFIXES) => Some(ReadGroup::Config),
            None => Some(ReadGroup::Runtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RegisterStore;

    const METER: &str = r#"{
        "name": "sample meter",
        "order": "msr",
        "common": { "fncode": 4 },
        "groups": { "config": ["Info"], "runtime": ["Meter"] },
        "fields": {
            "MeterPower": { "register": 29, "datatype": "int32", "nan": true },
            "InfoSerialNumber": { "register": 6, "datatype": "uint64" },
            "InfoName": { "register": 10, "words": 4, "datatype": "string_ascii" },
            "MeterEnergy": { "register": 40, "datatype": "uint32", "scale": 2 },
            "Relay": { "register": 2, "datatype": "boolean", "fncode": 1 }
        }
    }"#;

    #[test]
    fn test_descriptors_in_address_order() {
        let driver: JsonDriver = METER.parse().unwrap();
        let names: Vec<&str> = driver.registers().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["Relay", "InfoSerialNumber", "InfoName", "MeterPower", "MeterEnergy"]
        );
        let relay = driver.registers().get("Relay").unwrap();
        assert_eq!(relay.function, ReadFunction::Coil);
        let power = driver.registers().get("MeterPower").unwrap();
        assert_eq!(power.function, ReadFunction::InputRegister);
    }

    #[test]
    fn test_groups() {
        let driver: JsonDriver = METER.parse().unwrap();
        let config = driver.address_sets(Some(ReadGroup::Config));
        assert_eq!(config[&ReadFunction::InputRegister].to_string(), "[6-13]");
        let runtime = driver.address_sets(Some(ReadGroup::Runtime));
        assert_eq!(runtime[&ReadFunction::InputRegister].to_string(), "[29-30, 40-41]");
        // Relay matches no group
        assert!(!runtime.contains_key(&ReadFunction::Coil));
        assert_eq!(driver.address_sets(None).len(), 2);
    }

    #[test]
    fn test_default_groups_by_prefix() {
        let driver: JsonDriver = r#"{
            "name": "plain",
            "fields": {
                "InfoModel": { "register": 0, "datatype": "uint16" },
                "ConfigMode": { "register": 1, "datatype": "uint16" },
                "Power": { "register": 5, "datatype": "int16" }
            }
        }"#
        .parse()
        .unwrap();
        let config = driver.address_sets(Some(ReadGroup::Config));
        assert_eq!(config[&ReadFunction::HoldingRegister].to_string(), "[0-1]");
        let runtime = driver.address_sets(Some(ReadGroup::Runtime));
        assert_eq!(runtime[&ReadFunction::HoldingRegister].to_string(), "[5]");
    }

    #[test]
    fn test_invalid_documents() {
        let err = r#"{"name": "x", "fields": {"A": {"register": 1, "datatype": "uint16", "fncode": 7}}}"#
            .parse::<JsonDriver>()
            .unwrap_err();
        assert!(matches!(err, DriverError::UnknownFunctionCode { code: 7, .. }));

        let err = r#"{"name": "x", "fields": {"A": {"register": 1, "datatype": "string_utf8"}}}"#
            .parse::<JsonDriver>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field 'A' of type string_utf8 needs an explicit word count"
        );

        let err = r#"{"name": "x", "fields": {"A": {"datatype": "uint16"}}}"#
            .parse::<JsonDriver>()
            .unwrap_err();
        assert!(matches!(err, DriverError::MissingRegister(_)));

        let err = r#"{"name": "x", "fields": {"A": {"register": 1, "datatype": "uint128"}}}"#
            .parse::<JsonDriver>()
            .unwrap_err();
        assert!(matches!(err, DriverError::Json(_)));
    }

    #[test]
    fn test_read_record() {
        let driver: JsonDriver = METER.parse().unwrap();
        let store = RegisterStore::new();
        store.update(|h| {
            h.save_words(6, &[0, 0, 0, 0x3039]);
            h.save_words(10, &[0x4B54, 0x4C00, 0, 0]);
            h.save_words(29, &[0x8000, 0x0000]);
            h.save_words(40, &[0x0001, 0x0000]);
            true
        });
        let record = driver.read_record(&store.snapshot()).unwrap();
        assert_eq!(record.get_field("InfoSerialNumber"), Some(&RtValue::UInt(12345)));
        assert_eq!(record.get_field("InfoName"), Some(&RtValue::String("KTL".into())));
        // sentinel
        assert_eq!(record.get_field("MeterPower"), Some(&RtValue::None));
        assert_eq!(
            record.get_field("MeterEnergy").map(|v| serde_json::to_value(v).unwrap()),
            Some(serde_json::json!("655.36"))
        );
        assert_eq!(record.get_field("Relay"), Some(&RtValue::None));
    }
}
