//! Features Module - Per-node traffic features
//!
//! Turns one run's packet records into a node × feature count table.
//!
//! - `control`: sent/received tallies per control subtype
//! - `data`: received sensing packets
//! - `aggregator`: merge + zero-fill into a `CountTable`
//! - `layout`: column schema, version and hash
//! - `table`: floating point table and the counts artifact

pub mod aggregator;
pub mod control;
pub mod data;
pub mod layout;
pub mod table;


pub use aggregator::{CountTable, FeatureAggregator};
pub use control::{ControlCounts, ControlPacketCounter};
pub use data::{DataCounts, DataPacketCounter};
pub use layout::{FeatureLayout, LayoutInfo, LAYOUT_VERSION};
pub use table::FeatureTable;

use crate::logic::trace::PacketRecord;

/// Count every tracked subtype plus received data for one run
pub fn extract_run<S: AsRef<str>>(records: &[PacketRecord], subtypes: &[S]) -> CountTable {
    let control: Vec<ControlCounts> = subtypes
        .iter()
        .map(|s| ControlPacketCounter::new(s.as_ref()).count(records))
        .collect();
    let data = DataPacketCounter::count(records);

    FeatureAggregator::for_subtypes(subtypes).aggregate(&control, &data)
}
