//! Discovery / scan controller.
//!
//! A timed window during which unsolicited Hello broadcasts from
//! unregistered nodes are collected. Outside a window every Hello is
//! ignored. Within one, each Hello passes three gates in order: scan
//! active, not already discovered this window, not already registered.
//! The transient list is cleared at the start of every window and capped —
//! first come, first served, no eviction.

use heapless::Vec;

use crate::protocol::{HelloPacket, MacAddr};

/// Maximum nodes held in one scan window's discovery list.
pub const MAX_DISCOVERED_NODES: usize = 16;

/// A node seen during the current scan window. Transient: lives only until
/// the next `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredNode {
    pub mac: MacAddr,
    pub device_type: u8,
    pub fw_version: u8,
    /// Gateway-side link quality at discovery time.
    pub rssi: i8,
    pub snr: i8,
    pub discovered_at_ms: u64,
}

/// Why a Hello did not enter the discovery list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloRejected {
    /// No scan window is active.
    NotScanning,
    /// This MAC is already in the current window's list.
    Duplicate,
    /// This MAC belongs to a registered node.
    AlreadyRegistered,
    /// The discovery list is full (dropped with a warning, no eviction).
    ListFull,
}

/// Scan window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Inactive,
    Scanning { deadline_ms: u64 },
}

/// The discovery controller.
pub struct ScanController {
    state: ScanState,
    discovered: Vec<DiscoveredNode, MAX_DISCOVERED_NODES>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanController {
    pub fn new() -> Self {
        Self {
            state: ScanState::Inactive,
            discovered: Vec::new(),
        }
    }

    /// Open a scan window. Clears the previous window's list.
    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.discovered.clear();
        self.state = ScanState::Scanning {
            deadline_ms: now_ms.saturating_add(duration_ms),
        };
        log::info!("scan: window open for {duration_ms} ms");
    }

    /// Close the window explicitly. Keeps the list (the operator may still
    /// pick a node to pair).
    pub fn stop(&mut self) {
        if self.is_scanning() {
            log::info!("scan: stopped, {} nodes discovered", self.discovered.len());
        }
        self.state = ScanState::Inactive;
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, ScanState::Scanning { .. })
    }

    /// Deadline poll, called once per update tick. Returns `true` when this
    /// call closed the window.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if let ScanState::Scanning { deadline_ms } = self.state {
            if now_ms >= deadline_ms {
                log::info!("scan: window elapsed");
                self.stop();
                return true;
            }
        }
        false
    }

    /// Offer an inbound Hello to the current window.
    ///
    /// `registered` is whether the MAC already belongs to a registered node
    /// (checked by the caller against the registry — a registered node
    /// re-announcing must not re-enter discovery).
    pub fn offer_hello(
        &mut self,
        pkt: &HelloPacket,
        rssi: i8,
        snr: i8,
        now_ms: u64,
        registered: bool,
    ) -> Result<DiscoveredNode, HelloRejected> {
        if !self.is_scanning() {
            return Err(HelloRejected::NotScanning);
        }
        if self.discovered.iter().any(|d| d.mac == pkt.mac) {
            return Err(HelloRejected::Duplicate);
        }
        if registered {
            return Err(HelloRejected::AlreadyRegistered);
        }

        let node = DiscoveredNode {
            mac: pkt.mac,
            device_type: pkt.device_type,
            fw_version: pkt.fw_version,
            rssi,
            snr,
            discovered_at_ms: now_ms,
        };
        if self.discovered.push(node).is_err() {
            log::warn!("scan: discovery list full, dropping {}", pkt.mac);
            return Err(HelloRejected::ListFull);
        }
        log::info!("scan: new device {}", pkt.mac);
        Ok(node)
    }

    /// Nodes discovered in the current (or last closed) window.
    pub fn discovered(&self) -> &[DiscoveredNode] {
        &self.discovered
    }

    /// Device type recorded for `mac` this window, if any — used to backfill
    /// the registry entry when pairing completes.
    pub fn device_type_for(&self, mac: &MacAddr) -> Option<u8> {
        self.discovered
            .iter()
            .find(|d| d.mac == *mac)
            .map(|d| d.device_type)
    }
}
