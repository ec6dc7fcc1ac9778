//! Register caching, read planning and typed decoding for field devices
//!
//! Device families describe their fields with [`registers::ReferenceDescriptor`]
//! tables. Address sets built from those tables are coalesced into read
//! transactions, the words read are committed to a [`registers::RegisterStore`],
//! and values are decoded from store snapshots with [`data_mgmt`].

pub mod constants;
pub mod data_mgmt;
pub mod drivers;
pub mod helpers;
pub mod readers;
pub mod registers;

pub use rangeset::{IntRange, RangeError, RangeSet};
