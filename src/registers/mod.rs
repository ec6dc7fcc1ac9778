mod dump;
mod reference;
mod store;

pub use dump::{parse_register_dump, DumpError};
pub use reference::{
    address_set, DataType, DeviceFamily, ReadFunction, ReadGroup, ReferenceDescriptor,
    RegisterTable,
};
pub use store::{RegisterStore, Snapshot, StoreHandle};
