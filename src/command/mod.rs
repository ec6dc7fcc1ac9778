mod decode;
mod plan;

pub use decode::decode;
pub use plan::plan;
