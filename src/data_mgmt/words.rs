//! Word-level decoding and encoding
//!
//! Pure functions that interpret runs of 16-bit words as integers, floats,
//! strings and bits. Bytes within a word are always big-endian (as delivered by
//! the transport); [`WordOrder`] only governs how multiple words are joined
//! into a wider number.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registers::DataType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{data_type} needs {expected} word(s), got {actual}")]
    WordCount {
        data_type: DataType,
        expected: usize,
        actual: usize,
    },
    #[error("Cannot assemble an integer from {0} words (1 to 4 supported)")]
    Width(usize),
    #[error("Bit {bit} out of range for a {bits}-bit value")]
    BitOutOfRange { bit: u32, bits: u32 },
    #[error("{0} is not a numeric data type")]
    NotNumeric(DataType),
    #[error("{0} is not a string data type")]
    NotString(DataType),
    #[error("Decimal overflow")]
    Overflow,
}

/// Order in which multi-word values are stored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordOrder {
    /// Most significant word at the lowest address (the Modbus convention)
    #[default]
    #[serde(rename = "msr", alias = "most_significant_first")]
    MostSignificantFirst,
    /// Least significant word at the lowest address
    #[serde(rename = "lsr", alias = "least_significant_first")]
    LeastSignificantFirst,
}

/// Join 1 to 4 words into an unsigned integer
pub fn words_to_u64(words: &[u16], order: WordOrder) -> Result<u64, DecodeError> {
    if words.is_empty() || words.len() > 4 {
        return Err(DecodeError::Width(words.len()));
    }
    let join = |acc: u64, w: &u16| (acc << 16) | u64::from(*w);
    let value = match order {
        WordOrder::MostSignificantFirst => words.iter().fold(0, join),
        WordOrder::LeastSignificantFirst => words.iter().rev().fold(0, join),
    };
    Ok(value)
}

/// Split the low `count` words of a value, most significant first, then apply `order`
pub fn u64_to_words(value: u64, count: usize, order: WordOrder) -> Result<Vec<u16>, DecodeError> {
    if count == 0 || count > 4 {
        return Err(DecodeError::Width(count));
    }
    let mut words: Vec<u16> = (0..count)
        .rev()
        .map(|i| (value >> (16 * i)) as u16)
        .collect();
    if order == WordOrder::LeastSignificantFirst {
        words.reverse();
    }
    Ok(words)
}

fn check_width(words: &[u16], data_type: DataType) -> Result<(), DecodeError> {
    let expected = data_type.word_length() as usize;
    if expected == 0 || words.len() != expected {
        return Err(DecodeError::WordCount {
            data_type,
            expected,
            actual: words.len(),
        });
    }
    Ok(())
}

/// Raw bit pattern of a fixed-width value
pub fn decode_raw(words: &[u16], data_type: DataType, order: WordOrder) -> Result<u64, DecodeError> {
    if !(data_type.is_integer() || data_type.is_float() || data_type == DataType::Boolean) {
        return Err(DecodeError::NotNumeric(data_type));
    }
    check_width(words, data_type)?;
    words_to_u64(words, order)
}

/// Decode an unsigned integer; the width comes from `data_type`, not from `words`
pub fn decode_unsigned(
    words: &[u16],
    data_type: DataType,
    order: WordOrder,
) -> Result<u64, DecodeError> {
    if !data_type.is_integer() {
        return Err(DecodeError::NotNumeric(data_type));
    }
    decode_raw(words, data_type, order)
}

/// Decode a two's complement signed integer (unsigned types are widened as-is)
pub fn decode_signed(
    words: &[u16],
    data_type: DataType,
    order: WordOrder,
) -> Result<i64, DecodeError> {
    let raw = decode_unsigned(words, data_type, order)?;
    if !data_type.is_signed() {
        return i64::try_from(raw).map_err(|_| DecodeError::Overflow);
    }
    Ok(sign_extend(raw, data_type.word_length() * 16))
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

pub fn decode_float(words: &[u16], data_type: DataType, order: WordOrder) -> Result<f64, DecodeError> {
    let raw = decode_raw(words, data_type, order)?;
    match data_type {
        DataType::Float32 => Ok(f64::from(f32::from_bits(raw as u32))),
        DataType::Float64 => Ok(f64::from_bits(raw)),
        other => Err(DecodeError::NotNumeric(other)),
    }
}

/// Encode an unsigned value into the words of `data_type`
pub fn encode_unsigned(
    value: u64,
    data_type: DataType,
    order: WordOrder,
) -> Result<Vec<u16>, DecodeError> {
    if !data_type.is_integer() {
        return Err(DecodeError::NotNumeric(data_type));
    }
    let bits = data_type.word_length() * 16;
    if bits < 64 && value >> bits != 0 {
        return Err(DecodeError::Overflow);
    }
    u64_to_words(value, data_type.word_length() as usize, order)
}

/// Encode a signed value into the words of `data_type`
pub fn encode_signed(value: i64, data_type: DataType, order: WordOrder) -> Result<Vec<u16>, DecodeError> {
    if !data_type.is_signed() {
        let value = u64::try_from(value).map_err(|_| DecodeError::Overflow)?;
        return encode_unsigned(value, data_type, order);
    }
    let bits = data_type.word_length() * 16;
    if bits < 64 {
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(DecodeError::Overflow);
        }
    }
    u64_to_words(value as u64, data_type.word_length() as usize, order)
}

/// Bytes of a word run, high byte first within each word, in address order
pub fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Pack bytes into words, high byte first; an odd trailing byte is zero padded
pub fn bytes_to_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c.get(1).copied().unwrap_or(0)]))
        .collect()
}

/// Decode a string from a word run.
///
/// Invalid input never fails: non-ASCII bytes in ASCII strings and malformed
/// UTF-8 sequences are replaced with U+FFFD. With `trim`, leading and trailing
/// whitespace and NUL padding are removed.
pub fn decode_string(words: &[u16], data_type: DataType, trim: bool) -> Result<String, DecodeError> {
    let bytes = words_to_bytes(words);
    let s = match data_type {
        DataType::StringAscii => bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
            .collect::<String>(),
        DataType::StringUtf8 => String::from_utf8_lossy(&bytes).into_owned(),
        other => return Err(DecodeError::NotString(other)),
    };
    if trim {
        Ok(s.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string())
    } else {
        Ok(s)
    }
}

/// Encode a string into exactly `word_count` words, NUL padded or truncated
pub fn encode_string(value: &str, word_count: usize) -> Vec<u16> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(word_count * 2, 0);
    bytes_to_words(&bytes)
}

/// Test a bit of a 1 to 4 word value; bit 0 is the least significant bit
pub fn bit_is_set(words: &[u16], bit: u32, order: WordOrder) -> Result<bool, DecodeError> {
    let value = words_to_u64(words, order)?;
    let bits = words.len() as u32 * 16;
    if bit >= bits {
        return Err(DecodeError::BitOutOfRange { bit, bits });
    }
    Ok(value & (1 << bit) != 0)
}
