//! Exact decimal numbers for fixed-scale register values
//!
//! A [`Decimal`] is an `i128` mantissa with a base-10 scale, i.e. the value
//! `mantissa * 10^-scale`. Arithmetic is exact; operations that must drop
//! digits (division, reducing the scale) round half away from zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::words::{decode_signed, decode_unsigned, DecodeError, WordOrder};
use crate::registers::DataType;

#[derive(Clone, Copy, Debug, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

fn pow10(exp: u32) -> Result<i128, DecodeError> {
    10i128.checked_pow(exp).ok_or(DecodeError::Overflow)
}

fn add_scales(a: u32, b: u32) -> Result<u32, DecodeError> {
    a.checked_add(b).ok_or(DecodeError::Overflow)
}

/// Integer division rounding half away from zero
fn div_half_up(num: i128, den: i128) -> Result<i128, DecodeError> {
    if den == 0 {
        return Err(DecodeError::Overflow);
    }
    let q = num.checked_div(den).ok_or(DecodeError::Overflow)?;
    let r = num % den;
    if r.unsigned_abs() >= den.unsigned_abs() - r.unsigned_abs() {
        let step = if (num < 0) == (den < 0) { 1 } else { -1 };
        return q.checked_add(step).ok_or(DecodeError::Overflow);
    }
    Ok(q)
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    pub const fn new(mantissa: i128, scale: u32) -> Self {
        Decimal { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Shift the decimal point `places` to the left; exact
    pub fn move_point_left(self, places: u32) -> Result<Self, DecodeError> {
        Ok(Decimal {
            mantissa: self.mantissa,
            scale: add_scales(self.scale, places)?,
        })
    }

    /// Shift the decimal point `places` to the right, growing the mantissa only
    /// when the scale is exhausted
    pub fn move_point_right(self, places: u32) -> Result<Self, DecodeError> {
        if places <= self.scale {
            return Ok(Decimal {
                mantissa: self.mantissa,
                scale: self.scale - places,
            });
        }
        let mantissa = self
            .mantissa
            .checked_mul(pow10(places - self.scale)?)
            .ok_or(DecodeError::Overflow)?;
        Ok(Decimal { mantissa, scale: 0 })
    }

    /// Change the scale, rounding half away from zero when digits are dropped
    pub fn rescale(self, scale: u32) -> Result<Self, DecodeError> {
        let mantissa = match scale.cmp(&self.scale) {
            Ordering::Equal => self.mantissa,
            Ordering::Greater => self
                .mantissa
                .checked_mul(pow10(scale - self.scale)?)
                .ok_or(DecodeError::Overflow)?,
            Ordering::Less => div_half_up(self.mantissa, pow10(self.scale - scale)?)?,
        };
        Ok(Decimal { mantissa, scale })
    }

    /// Change the scale, dropping extra digits (rounding toward zero)
    pub fn truncate(self, scale: u32) -> Result<Self, DecodeError> {
        if scale >= self.scale {
            return self.rescale(scale);
        }
        Ok(Decimal {
            mantissa: self.mantissa / pow10(self.scale - scale)?,
            scale,
        })
    }

    /// Drop trailing fractional zeros
    pub fn normalize(self) -> Self {
        let mut d = self;
        while d.scale > 0 && d.mantissa % 10 == 0 {
            d.mantissa /= 10;
            d.scale -= 1;
        }
        d
    }

    fn aligned(a: Decimal, b: Decimal) -> Result<(i128, i128, u32), DecodeError> {
        let scale = a.scale.max(b.scale);
        Ok((
            a.rescale(scale)?.mantissa,
            b.rescale(scale)?.mantissa,
            scale,
        ))
    }

    pub fn checked_add(self, other: Decimal) -> Result<Self, DecodeError> {
        let (a, b, scale) = Decimal::aligned(self, other)?;
        let mantissa = a.checked_add(b).ok_or(DecodeError::Overflow)?;
        Ok(Decimal { mantissa, scale })
    }

    pub fn checked_sub(self, other: Decimal) -> Result<Self, DecodeError> {
        let (a, b, scale) = Decimal::aligned(self, other)?;
        let mantissa = a.checked_sub(b).ok_or(DecodeError::Overflow)?;
        Ok(Decimal { mantissa, scale })
    }

    pub fn checked_mul(self, other: Decimal) -> Result<Self, DecodeError> {
        let mantissa = self
            .mantissa
            .checked_mul(other.mantissa)
            .ok_or(DecodeError::Overflow)?;
        Ok(Decimal {
            mantissa,
            scale: add_scales(self.scale, other.scale)?,
        })
    }

    /// Divide, producing a result with exactly `scale` fractional digits.
    /// Division by zero is reported as [`DecodeError::Overflow`].
    pub fn checked_div(self, other: Decimal, scale: u32) -> Result<Self, DecodeError> {
        // (m1 / 10^s1) / (m2 / 10^s2) * 10^scale = m1 * 10^(scale + s2) / (m2 * 10^s1)
        let num = self
            .mantissa
            .checked_mul(pow10(add_scales(scale, other.scale)?)?)
            .ok_or(DecodeError::Overflow)?;
        let den = other
            .mantissa
            .checked_mul(pow10(self.scale)?)
            .ok_or(DecodeError::Overflow)?;
        Ok(Decimal {
            mantissa: div_half_up(num, den)?,
            scale,
        })
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Decimal::new(i128::from(v), 0)
    }
}

impl From<u64> for Decimal {
    fn from(v: u64) -> Self {
        Decimal::new(i128::from(v), 0)
    }
}

impl From<i32> for Decimal {
    fn from(v: i32) -> Self {
        Decimal::new(i128::from(v), 0)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = self.mantissa.signum();
        if sign != other.mantissa.signum() || sign == 0 {
            return sign.cmp(&other.mantissa.signum());
        }
        match Decimal::aligned(*self, *other) {
            Ok((a, b, _)) => a.cmp(&b),
            // Same sign, and the side with the smaller scale does not fit once
            // aligned, so it has the larger magnitude
            Err(_) => {
                let big = if self.scale < other.scale {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                if sign < 0 {
                    big.reverse()
                } else {
                    big
                }
            }
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseDecimalError(String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid decimal '{}'", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part
            .chars()
            .chain(frac_part.chars())
            .all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }
        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = i128::from(c as u8 - b'0');
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or_else(err)?;
        }
        if negative {
            mantissa = -mantissa;
        }
        Ok(Decimal {
            mantissa,
            scale: frac_part.len() as u32,
        })
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Decode an integer field and apply `scale` implied fractional digits
pub fn decode_fixed_scale(
    words: &[u16],
    data_type: DataType,
    order: WordOrder,
    scale: u32,
) -> Result<Decimal, DecodeError> {
    let mantissa = if data_type.is_signed() {
        i128::from(decode_signed(words, data_type, order)?)
    } else {
        i128::from(decode_unsigned(words, data_type, order)?)
    };
    Ok(Decimal::new(mantissa, scale))
}
