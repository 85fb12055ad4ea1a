//! Data Packet Counter
//!
//! Successfully received sensing / application packets per sensor node.
//! Only the receiving side is tracked.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::logic::trace::{NodeId, NodeRole, PacketRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCounts {
    /// Every sensor seen as source or receiver; each has an entry, possibly 0
    pub received: BTreeMap<NodeId, u64>,
}

impl DataCounts {
    pub fn nodes(&self) -> BTreeSet<NodeId> {
        self.received.keys().cloned().collect()
    }
}

pub struct DataPacketCounter;

impl DataPacketCounter {
    pub fn count(records: &[PacketRecord]) -> DataCounts {
        let mut counts = DataCounts::default();

        for record in records.iter().filter(|r| r.is_delivered_data()) {
            let source = NodeId::new(&record.source_id);
            if source.role() == NodeRole::Sensor {
                counts.received.entry(source).or_insert(0);
            }

            let receiver = NodeId::new(&record.receiver_id);
            if receiver.role() == NodeRole::Sensor {
                *counts.received.entry(receiver).or_insert(0) += 1;
            }
        }

        tracing::debug!(nodes = counts.received.len(), "Data packets counted");
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::trace::{PacketStatus, PacketType};

    fn sensing(src: &str, dst: &str, status: &str) -> PacketRecord {
        PacketRecord::new(
            PacketType::Data,
            "App1_SENSOR",
            src,
            dst,
            PacketStatus::parse(status),
        )
    }

    #[test]
    fn test_received_tally() {
        let records = vec![
            sensing("SENSOR-1", "SENSOR-2", "Successful"),
            sensing("SENSOR-3", "SENSOR-2", "Successful"),
            sensing("SENSOR-2", "SINKNODE-1", "Successful"),
            sensing("SENSOR-4", "SENSOR-2", "Errored"),
        ];
        let counts = DataPacketCounter::count(&records);

        assert_eq!(counts.received.get(&NodeId::new("S-2")), Some(&2));
        // Senders that never received still show up with 0
        assert_eq!(counts.received.get(&NodeId::new("S-1")), Some(&0));
        assert_eq!(counts.received.get(&NodeId::new("S-3")), Some(&0));
        // Failed packets contribute no nodes
        assert_eq!(counts.received.get(&NodeId::new("S-4")), None);
        assert!(!counts.nodes().iter().any(|n| n.role().is_infrastructure()));
    }

    #[test]
    fn test_ignores_control_packets() {
        let records = vec![PacketRecord::new(
            PacketType::Control,
            "DIO",
            "SENSOR-1",
            "SENSOR-2",
            PacketStatus::Successful,
        )];
        assert!(DataPacketCounter::count(&records).received.is_empty());
    }
}
