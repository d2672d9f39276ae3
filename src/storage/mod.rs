// storage/mod.rs
// InfluxDB delivery module

pub mod batch;
mod http;
pub mod line_protocol;
mod schema;
mod udp;
mod writer;

// Re-export commonly used items
pub use batch::{should_flush, BatchConfig, PointBatcher};
pub use http::HttpWriter;
pub use line_protocol::{encode_batch, encode_point, Precision};
pub use schema::SchemaProvisioner;
pub use udp::UdpWriter;
pub use writer::{PointWriter, StoreWriter};
