//! Pairing state machine.
//!
//! Strictly single-flight: one Welcome/Ack exchange at a time, gateway-wide.
//!
//! ```text
//!   Idle ──begin──▶ WaitingAck ──Ack(OK)────▶ Success ┐
//!                       │        ──Ack(err)──▶ Failed  ├─▶ Idle
//!                       │        ──deadline──▶ Timeout ┘
//!                       └──cancel──▶ Idle (no outcome reported)
//! ```
//!
//! Terminal outcomes are returned as values for the service to act on
//! (register + persist + event); the session itself collapses straight back
//! to `Idle` — there is no retained Success/Failed state to get stuck in.

use log::{info, warn};

use crate::error::PairingError;
use crate::protocol::{AckPacket, AckStatus, MacAddr, PacketType};

/// Retained session state. Terminal states are transient, observed only
/// through [`PairingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    WaitingAck,
}

/// How a pairing attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Node acknowledged the Welcome with status OK.
    Success,
    /// Node acknowledged with an error status.
    Failed,
    /// No Ack within the pairing timeout.
    Timeout,
}

/// A terminal pairing result, handed to the service exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingResult {
    pub node_id: u8,
    pub mac: MacAddr,
    pub outcome: PairingOutcome,
}

/// The single pairing session slot.
pub struct PairingSession {
    state: PairingState,
    target_mac: MacAddr,
    assigned_id: u8,
    started_at_ms: u64,
}

impl Default for PairingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingSession {
    pub fn new() -> Self {
        Self {
            state: PairingState::Idle,
            target_mac: MacAddr::ZERO,
            assigned_id: 0,
            started_at_ms: 0,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == PairingState::Idle
    }

    /// The MAC being paired, while a session is in flight.
    pub fn target_mac(&self) -> MacAddr {
        self.target_mac
    }

    /// The ID reserved for the in-flight session.
    pub fn assigned_id(&self) -> u8 {
        self.assigned_id
    }

    /// Open a session for `mac` with the pre-allocated `node_id`.
    ///
    /// Rejected without any state change while another session is in flight —
    /// concurrent requests are refused, never queued.
    pub fn begin(&mut self, mac: MacAddr, node_id: u8, now_ms: u64) -> Result<(), PairingError> {
        if self.state != PairingState::Idle {
            warn!("pairing: already in progress, rejecting {mac}");
            return Err(PairingError::Busy);
        }
        self.state = PairingState::WaitingAck;
        self.target_mac = mac;
        self.assigned_id = node_id;
        self.started_at_ms = now_ms;
        info!("pairing: started with {mac}, assigning ID {node_id}");
        Ok(())
    }

    /// Feed an inbound Ack. Only a Welcome-type Ack while waiting is ours;
    /// everything else is ignored (command Acks are uncorrelated by design).
    pub fn on_ack(&mut self, ack: &AckPacket) -> Option<PairingResult> {
        if self.state != PairingState::WaitingAck || ack.ack_type != PacketType::Welcome as u8 {
            return None;
        }
        let outcome = if AckStatus::is_ok(ack.status) {
            info!("pairing: node {} acknowledged", self.assigned_id);
            PairingOutcome::Success
        } else {
            warn!(
                "pairing: node {} rejected welcome (status {})",
                self.assigned_id, ack.status
            );
            PairingOutcome::Failed
        };
        Some(self.collapse(outcome))
    }

    /// Deadline poll, called once per update tick.
    pub fn check_timeout(&mut self, now_ms: u64, timeout_ms: u64) -> Option<PairingResult> {
        if self.state != PairingState::WaitingAck {
            return None;
        }
        if now_ms.saturating_sub(self.started_at_ms) < timeout_ms {
            return None;
        }
        warn!("pairing: timeout waiting for node {}", self.assigned_id);
        Some(self.collapse(PairingOutcome::Timeout))
    }

    /// Forcibly reset to `Idle`, discarding the in-flight session. No
    /// outcome is reported for an explicit cancel.
    pub fn cancel(&mut self) {
        self.state = PairingState::Idle;
        self.target_mac = MacAddr::ZERO;
        self.assigned_id = 0;
    }

    fn collapse(&mut self, outcome: PairingOutcome) -> PairingResult {
        let result = PairingResult {
            node_id: self.assigned_id,
            mac: self.target_mac,
            outcome,
        };
        self.cancel();
        result
    }
}
