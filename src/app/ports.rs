//! Port traits — the hexagonal boundary between the gateway core and the host.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GatewayService (domain)
//! ```
//!
//! Driven adapters (clock, node storage, event sinks) implement these traits.
//! The [`GatewayService`](super::service::GatewayService) consumes them via
//! generics at call sites, so the core never touches the filesystem, wall
//! clock, or any uplink (HTTP/MQTT/LED) directly — those layers subscribe to
//! the event stream instead.

use crate::error::StoreError;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source. Every timeout in the core is a comparison against
/// this clock, which makes scan windows, pairing deadlines and the offline
/// sweep testable without real elapsed time.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch (boot). Must never go backwards.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → host)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`GatewayEvent`](super::events::GatewayEvent)s
/// through this port. Adapters decide where they go (log, MQTT publish,
/// status LED, web push).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::GatewayEvent);
}

// ───────────────────────────────────────────────────────────────
// Node store port (domain ↔ persistent registry)
// ───────────────────────────────────────────────────────────────

/// One persisted node record. Only identity fields are written — transient
/// runtime state (relay bitmap, RSSI/SNR, uptime, online) is meaningless
/// across a reboot and always reloads as defaults/offline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PersistedNode {
    pub id: u8,
    /// Printable colon-hex MAC.
    pub mac: String,
    #[serde(rename = "type")]
    pub device_type: u8,
    pub name: String,
}

/// Loads and persists the registered-node set.
///
/// Both operations are best-effort from the core's point of view: a missing
/// or corrupt store is "no saved state", never a startup failure.
pub trait NodeStorePort {
    /// Replace the stored node set.
    fn save(&mut self, nodes: &[PersistedNode]) -> Result<(), StoreError>;

    /// Load the stored node set. [`StoreError::NotFound`] on first boot.
    fn load(&self) -> Result<Vec<PersistedNode>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_node_document_shape() {
        let node = PersistedNode {
            id: 3,
            mac: "AA:BB:CC:11:22:33".into(),
            device_type: 1,
            name: "Node_3".into(),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"id\":3"));
        assert!(json.contains("\"mac\":\"AA:BB:CC:11:22:33\""));
        assert!(json.contains("\"type\":1"), "field keeps its wire name");
        let back: PersistedNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
