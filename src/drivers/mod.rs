//! Device register tables

pub mod ktl_ct;
pub mod schema;

pub use ktl_ct::{KtlCt, KtlCtData, KtlCtFault1};
pub use schema::{DriverError, DriverSchema, FieldOpts, JsonDriver};
