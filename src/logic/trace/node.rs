//! Node identity and role classification
//!
//! All counters go through `node_role` so the infrastructure exclusion rule
//! lives in one place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Long sensor prefix used by the simulator
const SENSOR_LONG_PREFIX: &str = "SENSOR-";
/// Short sensor prefix used in every artifact
const SENSOR_SHORT_PREFIX: &str = "S-";

static SINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sink").expect("static regex"));
static ROUTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)router").expect("static regex"));
static SENSOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^S-\d+$").expect("static regex"));

/// Role of a node in the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Sensor,
    Sink,
    Router,
    /// Anything else (broadcast addresses, unnamed devices)
    Other,
}

impl NodeRole {
    pub fn is_infrastructure(self) -> bool {
        matches!(self, NodeRole::Sink | NodeRole::Router)
    }
}

/// Rewrite a raw identifier to its short form (`SENSOR-3` -> `S-3`)
pub fn short_form(identifier: &str) -> String {
    identifier.trim().replace(SENSOR_LONG_PREFIX, SENSOR_SHORT_PREFIX)
}

/// Classify a raw or short-form identifier
pub fn node_role(identifier: &str) -> NodeRole {
    let short = short_form(identifier);
    if SINK_PATTERN.is_match(&short) {
        NodeRole::Sink
    } else if ROUTER_PATTERN.is_match(&short) {
        NodeRole::Router
    } else if SENSOR_PATTERN.is_match(&short) {
        NodeRole::Sensor
    } else {
        NodeRole::Other
    }
}

/// Short-form node identifier with natural ordering (`S-2` < `S-10`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(identifier: &str) -> Self {
        NodeId(short_form(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn role(&self) -> NodeRole {
        node_role(&self.0)
    }

    /// Split into text prefix and trailing number, if any
    fn sort_key(&self) -> (&str, Option<u64>) {
        let digits_at = self
            .0
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i);

        match digits_at {
            Some(i) => (&self.0[..i], self.0[i..].parse().ok()),
            None => (&self.0, None),
        }
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form() {
        assert_eq!(short_form("SENSOR-12"), "S-12");
        assert_eq!(short_form(" SENSOR-1 "), "S-1");
        assert_eq!(short_form("SINKNODE-1"), "SINKNODE-1");
    }

    #[test]
    fn test_node_role() {
        assert_eq!(node_role("SENSOR-4"), NodeRole::Sensor);
        assert_eq!(node_role("S-4"), NodeRole::Sensor);
        assert_eq!(node_role("SINKNODE-1"), NodeRole::Sink);
        assert_eq!(node_role("sinknode-2"), NodeRole::Sink);
        assert_eq!(node_role("ROUTER-7"), NodeRole::Router);
        assert_eq!(node_role("Router-1"), NodeRole::Router);
        assert_eq!(node_role("Broadcast-Address"), NodeRole::Other);
        assert!(node_role("SINKNODE-1").is_infrastructure());
        assert!(!node_role("SENSOR-1").is_infrastructure());
    }

    #[test]
    fn test_natural_order() {
        let mut nodes: Vec<NodeId> = ["S-10", "S-2", "S-1", "A"]
            .iter()
            .map(|s| NodeId::new(s))
            .collect();
        nodes.sort();
        let names: Vec<&str> = nodes.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["A", "S-1", "S-2", "S-10"]);
    }
}
