//! Named bit flags packed into register values
//!
//! Fault and status registers pack up to 32 (or 64) conditions into one value.
//! An enumeration implementing [`Bitmaskable`] declares the bit offset of each
//! condition; [`bitmask_set`] turns a raw value into the active members.

/// A member of a bit flag enumeration
pub trait Bitmaskable: Copy {
    /// Bit offset of this member, 0 being the least significant bit
    fn bit_offset(self) -> u32;
}

/// Resolve the members whose bit is set in `value`, sorted by bit offset.
///
/// Set bits with no matching member are ignored.
pub fn bitmask_set<T: Bitmaskable>(value: u64, members: &[T]) -> Vec<T> {
    let mut active: Vec<T> = members
        .iter()
        .copied()
        .filter(|m| m.bit_offset() < 64 && value & (1 << m.bit_offset()) != 0)
        .collect();
    active.sort_by_key(|m| m.bit_offset());
    active
}

/// Inverse of [`bitmask_set`]
pub fn bitmask_value<T: Bitmaskable>(members: &[T]) -> u64 {
    members
        .iter()
        .filter(|m| m.bit_offset() < 64)
        .fold(0, |acc, m| acc | (1 << m.bit_offset()))
}
