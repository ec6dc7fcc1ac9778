pub mod bitmask;
pub mod decimal;
pub mod models;
pub mod process;
pub mod words;

pub use bitmask::{bitmask_set, bitmask_value, Bitmaskable};
pub use decimal::{decode_fixed_scale, Decimal};
pub use models::{Record, RtValue};
pub use process::{
    read_bit, read_fixed_scale, read_flags, read_record, read_value, read_value_with_sentinel,
    sentinel_for, DecodeOptions,
};
pub use words::{DecodeError, WordOrder};
