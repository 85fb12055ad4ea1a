//! Packet records - one typed row of a packet trace

use serde::{Deserialize, Serialize};

/// Packet category as reported by the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketType {
    Control,
    /// Application / sensing traffic
    Data,
    Other(String),
}

impl PacketType {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("Control_Packet") {
            PacketType::Control
        } else if raw.eq_ignore_ascii_case("Sensing") || raw.eq_ignore_ascii_case("Data") {
            PacketType::Data
        } else {
            PacketType::Other(raw.to_string())
        }
    }
}

/// Delivery outcome of a packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketStatus {
    Successful,
    Failed(String),
}

impl PacketStatus {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("Successful") {
            PacketStatus::Successful
        } else {
            PacketStatus::Failed(raw.to_string())
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, PacketStatus::Successful)
    }
}

/// One row of a run's packet trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub packet_type: PacketType,
    /// Control subtype (DAO, DIO, ...) or application name
    pub subtype: String,
    /// Raw source identifier (not yet shortened)
    pub source_id: String,
    /// Raw receiver identifier (not yet shortened)
    pub receiver_id: String,
    pub status: PacketStatus,
}

impl PacketRecord {
    pub fn new(
        packet_type: PacketType,
        subtype: &str,
        source_id: &str,
        receiver_id: &str,
        status: PacketStatus,
    ) -> Self {
        Self {
            packet_type,
            subtype: subtype.trim().to_string(),
            source_id: source_id.trim().to_string(),
            receiver_id: receiver_id.trim().to_string(),
            status,
        }
    }

    /// Successful control packet carrying the given subtype
    pub fn is_control(&self, subtype: &str) -> bool {
        self.packet_type == PacketType::Control
            && self.status.is_successful()
            && self.subtype == subtype
    }

    /// Successful data / sensing packet
    pub fn is_delivered_data(&self) -> bool {
        self.packet_type == PacketType::Data && self.status.is_successful()
    }
}
