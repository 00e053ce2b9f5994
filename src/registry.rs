//! Device registry — the directory of paired nodes.
//!
//! Bounded table keyed by node ID and by hardware address. Capacity is small
//! (32), so every lookup is a linear scan — no index structures, same as the
//! rest of this codebase's fixed-slot tables.
//!
//! Liveness is pull-based: inbound Data/Heartbeat ingestion marks a node
//! online; the periodic [`sweep_offline`](DeviceRegistry::sweep_offline)
//! marks it offline once `now - last_seen` exceeds the threshold. There is
//! no active probing.

use core::fmt::Write as _;

use heapless::{String, Vec};
use log::{info, warn};

use crate::error::RegistryError;
use crate::protocol::{DeviceType, MacAddr, NODE_ID_BROADCAST, NODE_ID_UNASSIGNED};

/// Maximum number of registered nodes.
pub const MAX_REGISTERED_NODES: usize = 32;

/// Maximum node name length.
pub const NODE_NAME_LEN: usize = 32;

/// A paired node and its last-known runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredNode {
    /// Gateway-assigned handle, 1..=254.
    pub node_id: u8,
    pub mac: MacAddr,
    pub device_type: u8,
    pub name: String<NODE_NAME_LEN>,
    /// Last reported relay bitmap.
    pub relay_status: u8,
    pub last_rssi: i8,
    pub last_snr: i8,
    /// Node-reported uptime, seconds.
    pub uptime_secs: u32,
    /// Gateway clock timestamp of the last Data/Heartbeat.
    pub last_seen_ms: u64,
    pub online: bool,
}

impl RegisteredNode {
    /// A freshly paired node: online, seen now, runtime fields zeroed.
    pub fn paired(node_id: u8, mac: MacAddr, device_type: u8, now_ms: u64) -> Self {
        let mut name = String::new();
        let _ = write!(name, "Node_{node_id}");
        Self {
            node_id,
            mac,
            device_type,
            name,
            relay_status: 0,
            last_rssi: 0,
            last_snr: 0,
            uptime_secs: 0,
            last_seen_ms: now_ms,
            online: true,
        }
    }

    /// A node reconstructed from the persisted store: offline until it
    /// reports in, regardless of its state when saved.
    pub fn loaded(node_id: u8, mac: MacAddr, device_type: u8, name: &str) -> Self {
        // Overlong persisted names keep what fits.
        let mut n = String::new();
        for ch in name.chars() {
            if n.push(ch).is_err() {
                break;
            }
        }
        Self {
            node_id,
            mac,
            device_type,
            name: n,
            relay_status: 0,
            last_rssi: 0,
            last_snr: 0,
            uptime_secs: 0,
            last_seen_ms: 0,
            online: false,
        }
    }
}

/// The registered-node table.
pub struct DeviceRegistry {
    nodes: Vec<RegisteredNode, MAX_REGISTERED_NODES>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    // ── Lookup ────────────────────────────────────────────────

    pub fn node_by_id(&self, node_id: u8) -> Option<&RegisteredNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn node_by_id_mut(&mut self, node_id: u8) -> Option<&mut RegisteredNode> {
        self.nodes.iter_mut().find(|n| n.node_id == node_id)
    }

    pub fn node_by_mac(&self, mac: &MacAddr) -> Option<&RegisteredNode> {
        self.nodes.iter().find(|n| n.mac == *mac)
    }

    pub fn contains_mac(&self, mac: &MacAddr) -> bool {
        self.node_by_mac(mac).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.online).count()
    }

    // ── Mutation ──────────────────────────────────────────────

    /// Append a node, enforcing the uniqueness invariants: no two nodes may
    /// share an ID or a MAC, and the table is capped.
    pub fn add(&mut self, node: RegisteredNode) -> Result<(), RegistryError> {
        if self.node_by_id(node.node_id).is_some() {
            return Err(RegistryError::DuplicateId);
        }
        if self.contains_mac(&node.mac) {
            return Err(RegistryError::DuplicateMac);
        }
        let id = node.node_id;
        if self.nodes.push(node).is_err() {
            return Err(RegistryError::CapacityFull);
        }
        info!("registry: node {id} added");
        Ok(())
    }

    /// Remove a node by ID. Returns `true` if a node was removed.
    pub fn remove(&mut self, node_id: u8) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.node_id != node_id);
        let removed = self.nodes.len() != before;
        if removed {
            info!("registry: node {node_id} removed");
        }
        removed
    }

    /// Replace the whole table (persistence reload). Entries that violate
    /// the uniqueness invariants or exceed capacity are skipped with a
    /// warning rather than aborting the load.
    pub fn replace_all(&mut self, nodes: impl IntoIterator<Item = RegisteredNode>) {
        self.nodes.clear();
        for node in nodes {
            let id = node.node_id;
            if let Err(e) = self.add(node) {
                warn!("registry: skipping loaded node {id}: {e}");
            }
        }
    }

    // ── ID allocation ─────────────────────────────────────────

    /// First unused ID in 1..=254. `0` (unassigned) and `255` (broadcast)
    /// are permanently reserved. `None` when the space is exhausted.
    pub fn next_free_id(&self) -> Option<u8> {
        (1..NODE_ID_BROADCAST)
            .find(|id| *id != NODE_ID_UNASSIGNED && self.node_by_id(*id).is_none())
    }

    // ── Liveness ──────────────────────────────────────────────

    /// Mark nodes offline whose last report is older than `threshold_ms`.
    /// Idempotent: an already-offline node is never touched (and never flips
    /// back online here — only packet ingestion does that). Returns the IDs
    /// that changed state in this sweep.
    pub fn sweep_offline(
        &mut self,
        now_ms: u64,
        threshold_ms: u64,
    ) -> Vec<u8, MAX_REGISTERED_NODES> {
        let mut went_offline = Vec::new();
        for node in &mut self.nodes {
            if node.online && now_ms.saturating_sub(node.last_seen_ms) > threshold_ms {
                node.online = false;
                warn!("registry: node {} went offline", node.node_id);
                let _ = went_offline.push(node.node_id);
            }
        }
        went_offline
    }
}

/// Default device type assumed when pairing completes without a matching
/// discovery record.
pub const DEFAULT_DEVICE_TYPE: u8 = DeviceType::Relay2Ch as u8;
