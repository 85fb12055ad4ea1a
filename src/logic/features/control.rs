//! Control Packet Counter
//!
//! Sent / received tallies of one control subtype (DAO, DIO, ...) per node.
//! Only successful packets count; sinks and routers are never tallied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logic::trace::{NodeId, PacketRecord};

/// Per-node tallies for one control subtype.
/// Nodes with zero occurrences are absent; the aggregator zero-fills them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCounts {
    pub subtype: String,
    pub sent: BTreeMap<NodeId, u64>,
    pub received: BTreeMap<NodeId, u64>,
}

pub struct ControlPacketCounter {
    subtype: String,
}

impl ControlPacketCounter {
    pub fn new(subtype: &str) -> Self {
        Self {
            subtype: subtype.to_string(),
        }
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn count(&self, records: &[PacketRecord]) -> ControlCounts {
        let mut counts = ControlCounts {
            subtype: self.subtype.clone(),
            ..Default::default()
        };

        for record in records.iter().filter(|r| r.is_control(&self.subtype)) {
            let source = NodeId::new(&record.source_id);
            if !source.role().is_infrastructure() {
                *counts.sent.entry(source).or_insert(0) += 1;
            }

            let receiver = NodeId::new(&record.receiver_id);
            if !receiver.role().is_infrastructure() {
                *counts.received.entry(receiver).or_insert(0) += 1;
            }
        }

        tracing::debug!(
            subtype = %self.subtype,
            senders = counts.sent.len(),
            receivers = counts.received.len(),
            "Control packets counted"
        );
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::trace::{PacketStatus, PacketType};

    fn control(subtype: &str, src: &str, dst: &str, status: &str) -> PacketRecord {
        PacketRecord::new(
            PacketType::Control,
            subtype,
            src,
            dst,
            PacketStatus::parse(status),
        )
    }

    #[test]
    fn test_counts_only_successful_requested_subtype() {
        let records = vec![
            control("DIO", "SENSOR-1", "SENSOR-2", "Successful"),
            control("DIO", "SENSOR-1", "SENSOR-3", "Successful"),
            control("DIO", "SENSOR-2", "SENSOR-1", "Collided"),
            control("DAO", "SENSOR-2", "SENSOR-1", "Successful"),
        ];
        let counts = ControlPacketCounter::new("DIO").count(&records);

        assert_eq!(counts.sent.get(&NodeId::new("S-1")), Some(&2));
        assert_eq!(counts.sent.get(&NodeId::new("S-2")), None);
        assert_eq!(counts.received.get(&NodeId::new("S-2")), Some(&1));
        assert_eq!(counts.received.get(&NodeId::new("S-3")), Some(&1));
        assert_eq!(counts.received.get(&NodeId::new("S-1")), None);
    }

    #[test]
    fn test_infrastructure_excluded_both_directions() {
        let records = vec![
            control("DIO", "SINKNODE-1", "SENSOR-1", "Successful"),
            control("DIO", "ROUTER-2", "SENSOR-1", "Successful"),
            control("DIO", "SENSOR-1", "Router-2", "Successful"),
        ];
        let counts = ControlPacketCounter::new("DIO").count(&records);

        assert_eq!(counts.sent.len(), 1);
        assert_eq!(counts.sent.get(&NodeId::new("S-1")), Some(&1));
        assert_eq!(counts.received.len(), 1);
        assert_eq!(counts.received.get(&NodeId::new("S-1")), Some(&2));
    }

    #[test]
    fn test_tally_matches_manual_count() {
        let records = vec![
            control("DAO", "SENSOR-1", "SENSOR-2", "Successful"),
            control("DAO", "SENSOR-2", "SENSOR-1", "Successful"),
            control("DAO", "SENSOR-2", "SINKNODE-1", "Successful"),
            control("DAO", "SENSOR-3", "SENSOR-2", "Errored"),
            control("DAO", "ROUTER-1", "SENSOR-3", "Successful"),
        ];
        let counts = ControlPacketCounter::new("DAO").count(&records);

        let manual_sent = records
            .iter()
            .filter(|r| r.status.is_successful() && !NodeId::new(&r.source_id).role().is_infrastructure())
            .count() as u64;
        let manual_received = records
            .iter()
            .filter(|r| r.status.is_successful() && !NodeId::new(&r.receiver_id).role().is_infrastructure())
            .count() as u64;

        assert_eq!(counts.sent.values().sum::<u64>(), manual_sent);
        assert_eq!(counts.received.values().sum::<u64>(), manual_received);
    }
}
