//! Trace Module - Raw packet trace parsing
//!
//! - `record`: typed packet records
//! - `node`: node identifiers and the sensor / sink / router classification
//! - `reader`: schema-checked CSV reader

pub mod node;
pub mod reader;
pub mod record;

pub use node::{node_role, NodeId, NodeRole};
pub use reader::PacketTraceReader;
pub use record::{PacketRecord, PacketStatus, PacketType};
