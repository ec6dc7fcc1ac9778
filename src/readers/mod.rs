//! Reading device words into register stores

pub mod refresh;
pub mod static_map;
pub mod transport;

pub use refresh::{plan_reads, refresh, DevicePoller, ReadSummary, ReaderConfig};
pub use static_map::{ReadTransaction, StaticWordMap};
pub use transport::{TransportError, WordTransport, WriteFunction};
