//! Descriptor driven value reads
//!
//! Combines a [`Snapshot`] with a [`ReferenceDescriptor`] to produce typed
//! values. Missing words are not an error: every read returns `Ok(None)` when
//! any word of the field was never read, and sentinel filtering turns the
//! "not available" bit pattern of a type into `None` as well. A descriptor
//! whose word length does not fit its data type is reported as an error.

use crate::data_mgmt::bitmask::{bitmask_set, Bitmaskable};
use crate::data_mgmt::decimal::{decode_fixed_scale, Decimal};
use crate::data_mgmt::models::{Record, RtValue};
use crate::data_mgmt::words::{
    bit_is_set, decode_float, decode_raw, decode_signed, decode_string, decode_unsigned,
    words_to_bytes, DecodeError, WordOrder,
};
use crate::registers::{DataType, ReferenceDescriptor, Snapshot};

/// How values are decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub order: WordOrder,
    /// Strip surrounding whitespace and NUL padding from strings
    pub trim: bool,
    /// Treat the sentinel pattern of each type as absent
    pub not_a_number: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            order: WordOrder::MostSignificantFirst,
            trim: true,
            not_a_number: false,
        }
    }
}

impl DecodeOptions {
    pub fn with_order(order: WordOrder) -> Self {
        DecodeOptions {
            order,
            ..Default::default()
        }
    }
}

/// The raw "not available" pattern of a data type.
///
/// Floats have no single pattern; any NaN is treated as not available.
pub fn sentinel_for(data_type: DataType) -> Option<u64> {
    match data_type {
        DataType::UInt16 => Some(0xFFFF),
        DataType::Int16 => Some(0x8000),
        DataType::UInt32 => Some(0xFFFF_FFFF),
        DataType::Int32 => Some(0x8000_0000),
        DataType::UInt64 => Some(u64::MAX),
        DataType::Int64 => Some(0x8000_0000_0000_0000),
        _ => None,
    }
}

fn field_words(snapshot: &Snapshot, descriptor: &ReferenceDescriptor) -> Option<Vec<u16>> {
    let len = descriptor.effective_word_length() as usize;
    if len == 0 {
        return None;
    }
    snapshot.get_run(descriptor.address, len)
}

/// Check the sentinel before interpreting the value
fn is_sentinel(
    words: &[u16],
    data_type: DataType,
    opts: &DecodeOptions,
    sentinel: Option<u64>,
) -> Result<bool, DecodeError> {
    match sentinel {
        Some(pattern) if opts.not_a_number => Ok(decode_raw(words, data_type, opts.order)? == pattern),
        _ => Ok(false),
    }
}

/// Read a field, filtering the type's default sentinel if enabled
pub fn read_value(
    snapshot: &Snapshot,
    descriptor: &ReferenceDescriptor,
    opts: &DecodeOptions,
) -> Result<Option<RtValue>, DecodeError> {
    read_value_with_sentinel(snapshot, descriptor, opts, sentinel_for(descriptor.data_type))
}

/// Read a field with an explicit sentinel pattern
pub fn read_value_with_sentinel(
    snapshot: &Snapshot,
    descriptor: &ReferenceDescriptor,
    opts: &DecodeOptions,
    sentinel: Option<u64>,
) -> Result<Option<RtValue>, DecodeError> {
    let Some(words) = field_words(snapshot, descriptor) else {
        return Ok(None);
    };
    let data_type = descriptor.data_type;

    let value = match data_type {
        DataType::Boolean => RtValue::Bool(words.iter().any(|w| *w != 0)),
        DataType::StringAscii | DataType::StringUtf8 => {
            RtValue::String(decode_string(&words, data_type, opts.trim)?)
        }
        DataType::Bytes => RtValue::Bytes(words_to_bytes(&words)),
        DataType::Float32 | DataType::Float64 => {
            let f = decode_float(&words, data_type, opts.order)?;
            if opts.not_a_number && f.is_nan() {
                return Ok(None);
            }
            RtValue::Float(f)
        }
        _ => {
            if is_sentinel(&words, data_type, opts, sentinel)? {
                return Ok(None);
            }
            if data_type.is_signed() {
                RtValue::Int(decode_signed(&words, data_type, opts.order)?)
            } else {
                RtValue::UInt(decode_unsigned(&words, data_type, opts.order)?)
            }
        }
    };
    Ok(Some(value))
}

/// Read an integer field as a decimal with `scale` implied fractional digits
pub fn read_fixed_scale(
    snapshot: &Snapshot,
    descriptor: &ReferenceDescriptor,
    opts: &DecodeOptions,
    scale: u32,
) -> Result<Option<Decimal>, DecodeError> {
    let Some(words) = field_words(snapshot, descriptor) else {
        return Ok(None);
    };
    if is_sentinel(&words, descriptor.data_type, opts, sentinel_for(descriptor.data_type))? {
        return Ok(None);
    }
    decode_fixed_scale(&words, descriptor.data_type, opts.order, scale).map(Some)
}

/// Test one bit of a field
pub fn read_bit(
    snapshot: &Snapshot,
    descriptor: &ReferenceDescriptor,
    bit: u32,
    order: WordOrder,
) -> Result<Option<bool>, DecodeError> {
    let Some(words) = field_words(snapshot, descriptor) else {
        return Ok(None);
    };
    bit_is_set(&words, bit, order).map(Some)
}

/// Resolve the active members of a flag register
pub fn read_flags<T: Bitmaskable>(
    snapshot: &Snapshot,
    descriptor: &ReferenceDescriptor,
    order: WordOrder,
    members: &[T],
) -> Result<Option<Vec<T>>, DecodeError> {
    let Some(words) = field_words(snapshot, descriptor) else {
        return Ok(None);
    };
    if !descriptor.data_type.is_integer() {
        return Err(DecodeError::NotNumeric(descriptor.data_type));
    }
    let value = decode_unsigned(&words, descriptor.data_type, order)?;
    Ok(Some(bitmask_set(value, members)))
}

/// Decode every descriptor into a record; `None` values are kept as absent
pub fn read_record<'a>(
    snapshot: &Snapshot,
    descriptors: impl IntoIterator<Item = &'a ReferenceDescriptor>,
    opts: &DecodeOptions,
) -> Result<Record, DecodeError> {
    let mut record = Record::new(snapshot.timestamp());
    for descriptor in descriptors {
        let value = read_value(snapshot, descriptor, opts)?;
        record.set_field(descriptor.name().to_string(), value.into());
    }
    Ok(record)
}
