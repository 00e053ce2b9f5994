//! LoRa P2P binary protocol definitions.
//!
//! Shared wire contract between the gateway and its relay nodes. All packets
//! are fixed-size, byte-packed, little-endian, and start with a one-byte type
//! tag — see [`packets`] for the explicit per-field codecs.

pub mod mac;
pub mod packets;

pub use mac::MacAddr;
pub use packets::{
    AckPacket, CommandPacket, ConfigPacket, DataPacket, HeartbeatPacket, HelloPacket, Packet,
    WelcomePacket,
};

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

/// Protocol version carried in future header revisions.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Sentinel for a node that has not been assigned an ID yet.
pub const NODE_ID_UNASSIGNED: u8 = 0x00;

/// Broadcast node ID — addresses every node at once.
pub const NODE_ID_BROADCAST: u8 = 0xFF;

/// The gateway's own reserved ID.
pub const GATEWAY_ID: u8 = 0xFE;

/// Maximum decoded packet size in bytes (64 hex chars on the wire).
pub const MAX_PACKET_SIZE: usize = 32;

/// Length of a hardware address.
pub const MAC_ADDR_LEN: usize = 6;

/// Interval at which nodes send full Data status reports (ms).
pub const STATUS_REPORT_INTERVAL_MS: u32 = 60_000;

/// Interval at which nodes send Heartbeat packets (ms).
pub const HEARTBEAT_INTERVAL_MS: u32 = 30_000;

// ---------------------------------------------------------------------------
// Packet type tags
// ---------------------------------------------------------------------------

/// One-byte discriminator at offset 0 of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Node → Gateway broadcast: discovery announcement.
    Hello = 0x01,
    /// Gateway → Node: ID assignment.
    Welcome = 0x02,
    /// Node → Gateway: acknowledgment.
    Ack = 0x03,
    /// Bidirectional: status snapshot.
    Data = 0x04,
    /// Gateway → Node: command.
    Command = 0x05,
    /// Gateway → Node: radio parameter update.
    Config = 0x06,
    /// Node → Gateway: periodic liveness signal.
    Heartbeat = 0x07,
}

impl PacketType {
    /// Classify a wire tag. Unknown tags yield `None` and are dropped by the
    /// dispatcher, never surfaced as errors.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Hello),
            0x02 => Some(Self::Welcome),
            0x03 => Some(Self::Ack),
            0x04 => Some(Self::Data),
            0x05 => Some(Self::Command),
            0x06 => Some(Self::Config),
            0x07 => Some(Self::Heartbeat),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Device types
// ---------------------------------------------------------------------------

/// Node hardware flavour, reported in Hello packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceType {
    Unknown = 0x00,
    /// 2-channel relay module.
    Relay2Ch = 0x01,
    /// 4-channel relay module.
    Relay4Ch = 0x02,
    /// Sensor-only module.
    Sensor = 0x03,
    /// The gateway itself.
    Gateway = 0xFF,
}

impl DeviceType {
    /// Classify a wire value, falling back to `Unknown` (never panics).
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x01 => Self::Relay2Ch,
            0x02 => Self::Relay4Ch,
            0x03 => Self::Sensor,
            0xFF => Self::Gateway,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

/// Command discriminator inside a [`CommandPacket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    /// Set the relay state bitmap (param1 = bitmap).
    RelaySet = 0x01,
    /// Toggle one relay (param1 = relay number 1-4).
    RelayToggle = 0x02,
    /// Soft-reset the node.
    Reset = 0x03,
    /// Restore factory defaults.
    FactoryReset = 0x04,
    /// Ask the node for an immediate Data report.
    RequestStatus = 0x05,
}

// ---------------------------------------------------------------------------
// Ack status / error codes
// ---------------------------------------------------------------------------

/// Status byte in an [`AckPacket`]. `0x00` means success; anything else is a
/// node-side error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckStatus {
    Ok = 0x00,
    InvalidCommand = 0x01,
    InvalidParam = 0x02,
    RelayFault = 0x03,
    EepromFault = 0x04,
    LoraFault = 0x05,
}

impl AckStatus {
    pub fn is_ok(v: u8) -> bool {
        v == Self::Ok as u8
    }
}

// ---------------------------------------------------------------------------
// Relay bitmap helpers
// ---------------------------------------------------------------------------

/// Read the state of relay `relay_num` (1-based) from a bitmap.
pub fn relay_state(bitmap: u8, relay_num: u8) -> bool {
    debug_assert!((1..=8).contains(&relay_num));
    (bitmap >> (relay_num - 1)) & 0x01 != 0
}

/// Set relay `relay_num` (1-based) in a bitmap.
pub fn set_relay(bitmap: u8, relay_num: u8) -> u8 {
    bitmap | (1 << (relay_num - 1))
}

/// Clear relay `relay_num` (1-based) in a bitmap.
pub fn clear_relay(bitmap: u8, relay_num: u8) -> u8 {
    bitmap & !(1 << (relay_num - 1))
}

/// Toggle relay `relay_num` (1-based) in a bitmap.
pub fn toggle_relay(bitmap: u8, relay_num: u8) -> u8 {
    bitmap ^ (1 << (relay_num - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_type_roundtrip() {
        for tag in [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07] {
            let ty = PacketType::from_u8(tag).unwrap();
            assert_eq!(ty as u8, tag);
        }
    }

    #[test]
    fn unknown_packet_type_is_none() {
        assert_eq!(PacketType::from_u8(0x00), None);
        assert_eq!(PacketType::from_u8(0x08), None);
        assert_eq!(PacketType::from_u8(0xFF), None);
    }

    #[test]
    fn device_type_falls_back_to_unknown() {
        assert_eq!(DeviceType::from_u8(0x42), DeviceType::Unknown);
        assert_eq!(DeviceType::from_u8(0x01), DeviceType::Relay2Ch);
        assert_eq!(DeviceType::from_u8(0xFF), DeviceType::Gateway);
    }

    #[test]
    fn relay_bitmap_helpers() {
        let mut bm = 0u8;
        bm = set_relay(bm, 1);
        bm = set_relay(bm, 3);
        assert!(relay_state(bm, 1));
        assert!(!relay_state(bm, 2));
        assert!(relay_state(bm, 3));

        bm = toggle_relay(bm, 3);
        assert!(!relay_state(bm, 3));

        bm = clear_relay(bm, 1);
        assert_eq!(bm, 0);
    }

    #[test]
    fn reserved_ids_are_distinct() {
        assert_ne!(NODE_ID_UNASSIGNED, NODE_ID_BROADCAST);
        assert_ne!(GATEWAY_ID, NODE_ID_BROADCAST);
    }
}
