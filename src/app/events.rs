//! Outbound gateway events.
//!
//! The [`GatewayService`](super::service::GatewayService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — log to serial, publish over MQTT,
//! blink the status LED, push to the web UI.

use crate::protocol::DataPacket;
use crate::scan::DiscoveredNode;

/// Structured events emitted by the gateway core.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// An unregistered node announced itself during an active scan window.
    NodeDiscovered(DiscoveredNode),

    /// A registered node delivered a Data status report (already ingested
    /// into the registry).
    NodeData { node_id: u8, data: DataPacket },

    /// A pairing attempt reached a terminal state.
    PairingComplete { node_id: u8, success: bool },

    /// The scan window closed (deadline or explicit stop).
    ScanFinished { discovered: usize },

    /// The offline sweep marked a node unreachable.
    NodeOffline { node_id: u8 },
}
