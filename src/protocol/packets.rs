//! Fixed-layout packet codecs.
//!
//! Wire format (all seven kinds):
//! ```text
//! ┌─────────┬──────────────────────────────┐
//! │ Tag (1B)│ fixed little-endian fields   │
//! └─────────┴──────────────────────────────┘
//! ```
//!
//! Every field lives at a fixed byte offset and is read/written explicitly
//! with `from_le_bytes`/`to_le_bytes` — no struct casting, so the codec is
//! independent of host layout and endianness. Decoding a buffer shorter than
//! the declared size yields `None` (a truncated frame, silently dropped by
//! the dispatcher). Trailing bytes beyond the fixed size are ignored.

use heapless::Vec;

use super::{MAC_ADDR_LEN, MAX_PACKET_SIZE, MacAddr, PacketType};

/// Encoded-packet buffer: every packet fits in the 32-byte radio MTU.
pub type PacketBuf = Vec<u8, MAX_PACKET_SIZE>;

fn mac_at(buf: &[u8], offset: usize) -> MacAddr {
    let mut mac = [0u8; MAC_ADDR_LEN];
    mac.copy_from_slice(&buf[offset..offset + MAC_ADDR_LEN]);
    MacAddr(mac)
}

// ---------------------------------------------------------------------------
// Hello — Node → Gateway broadcast (9 bytes)
// ---------------------------------------------------------------------------

/// Discovery announcement from an unregistered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloPacket {
    pub mac: MacAddr,
    pub device_type: u8,
    pub fw_version: u8,
}

impl HelloPacket {
    pub const SIZE: usize = 9;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Hello as u8);
        let _ = buf.extend_from_slice(&self.mac.0);
        let _ = buf.push(self.device_type);
        let _ = buf.push(self.fw_version);
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Hello as u8 {
            return None;
        }
        Some(Self {
            mac: mac_at(buf, 1),
            device_type: buf[7],
            fw_version: buf[8],
        })
    }
}

// ---------------------------------------------------------------------------
// Welcome — Gateway → Node, directed by MAC (9 bytes)
// ---------------------------------------------------------------------------

/// ID assignment sent to a node during pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomePacket {
    pub target_mac: MacAddr,
    pub assigned_id: u8,
}

impl WelcomePacket {
    pub const SIZE: usize = 9;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Welcome as u8);
        let _ = buf.extend_from_slice(&self.target_mac.0);
        let _ = buf.push(self.assigned_id);
        let _ = buf.push(0); // reserved
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Welcome as u8 {
            return None;
        }
        Some(Self {
            target_mac: mac_at(buf, 1),
            assigned_id: buf[7],
        })
    }
}

// ---------------------------------------------------------------------------
// Ack — Node → Gateway (4 bytes)
// ---------------------------------------------------------------------------

/// Acknowledgment of a Welcome or Command. `status == 0` is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPacket {
    pub node_id: u8,
    /// Packet-type tag of the packet being acknowledged.
    pub ack_type: u8,
    pub status: u8,
}

impl AckPacket {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Ack as u8);
        let _ = buf.push(self.node_id);
        let _ = buf.push(self.ack_type);
        let _ = buf.push(self.status);
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Ack as u8 {
            return None;
        }
        Some(Self {
            node_id: buf[1],
            ack_type: buf[2],
            status: buf[3],
        })
    }
}

// ---------------------------------------------------------------------------
// Data — bidirectional status snapshot (10 bytes)
// ---------------------------------------------------------------------------

/// Full status report: relay state, link quality as measured by the node,
/// battery, uptime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPacket {
    pub node_id: u8,
    pub relay_status: u8,
    pub rssi: i8,
    pub snr: i8,
    /// 0-100, or 0xFF when externally powered.
    pub battery_level: u8,
    /// Seconds since the node booted.
    pub uptime_secs: u32,
}

impl DataPacket {
    pub const SIZE: usize = 10;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Data as u8);
        let _ = buf.push(self.node_id);
        let _ = buf.push(self.relay_status);
        let _ = buf.push(self.rssi as u8);
        let _ = buf.push(self.snr as u8);
        let _ = buf.push(self.battery_level);
        let _ = buf.extend_from_slice(&self.uptime_secs.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Data as u8 {
            return None;
        }
        Some(Self {
            node_id: buf[1],
            relay_status: buf[2],
            rssi: buf[3] as i8,
            snr: buf[4] as i8,
            battery_level: buf[5],
            uptime_secs: u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Command — Gateway → Node, directed by ID or broadcast (5 bytes)
// ---------------------------------------------------------------------------

/// Fire-and-forget command. `target_id == 0xFF` addresses every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPacket {
    pub target_id: u8,
    pub cmd_type: u8,
    pub param1: u8,
    pub param2: u8,
}

impl CommandPacket {
    pub const SIZE: usize = 5;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Command as u8);
        let _ = buf.push(self.target_id);
        let _ = buf.push(self.cmd_type);
        let _ = buf.push(self.param1);
        let _ = buf.push(self.param2);
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Command as u8 {
            return None;
        }
        Some(Self {
            target_id: buf[1],
            cmd_type: buf[2],
            param1: buf[3],
            param2: buf[4],
        })
    }
}

// ---------------------------------------------------------------------------
// Config — Gateway → Node radio parameter update (12 bytes)
// ---------------------------------------------------------------------------

/// Radio parameter push. Range validation happens on the node side; the
/// gateway only guarantees the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigPacket {
    pub target_id: u8,
    pub frequency_hz: u32,
    pub spreading_factor: u8,
    pub bandwidth: u8,
    pub coding_rate: u8,
    pub tx_power_dbm: i8,
    pub preamble: u16,
}

impl ConfigPacket {
    pub const SIZE: usize = 12;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Config as u8);
        let _ = buf.push(self.target_id);
        let _ = buf.extend_from_slice(&self.frequency_hz.to_le_bytes());
        let _ = buf.push(self.spreading_factor);
        let _ = buf.push(self.bandwidth);
        let _ = buf.push(self.coding_rate);
        let _ = buf.push(self.tx_power_dbm as u8);
        let _ = buf.extend_from_slice(&self.preamble.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Config as u8 {
            return None;
        }
        Some(Self {
            target_id: buf[1],
            frequency_hz: u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            spreading_factor: buf[6],
            bandwidth: buf[7],
            coding_rate: buf[8],
            tx_power_dbm: buf[9] as i8,
            preamble: u16::from_le_bytes([buf[10], buf[11]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Heartbeat — Node → Gateway periodic liveness (6 bytes)
// ---------------------------------------------------------------------------

/// Lightweight liveness signal, cheaper than a full Data report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPacket {
    pub node_id: u8,
    pub relay_status: u8,
    pub error_flags: u8,
    pub seq_num: u16,
}

impl HeartbeatPacket {
    pub const SIZE: usize = 6;

    pub fn encode(&self) -> PacketBuf {
        let mut buf = PacketBuf::new();
        let _ = buf.push(PacketType::Heartbeat as u8);
        let _ = buf.push(self.node_id);
        let _ = buf.push(self.relay_status);
        let _ = buf.push(self.error_flags);
        let _ = buf.extend_from_slice(&self.seq_num.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || buf[0] != PacketType::Heartbeat as u8 {
            return None;
        }
        Some(Self {
            node_id: buf[1],
            relay_status: buf[2],
            error_flags: buf[3],
            seq_num: u16::from_le_bytes([buf[4], buf[5]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Tag dispatch
// ---------------------------------------------------------------------------

/// A decoded inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet {
    Hello(HelloPacket),
    Welcome(WelcomePacket),
    Ack(AckPacket),
    Data(DataPacket),
    Command(CommandPacket),
    Config(ConfigPacket),
    Heartbeat(HeartbeatPacket),
}

impl Packet {
    /// Classify and decode a raw frame by its first byte.
    ///
    /// Returns `None` for empty frames, unknown tags, and frames shorter than
    /// the fixed size their tag declares — all are treated as corruption and
    /// dropped without an error.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let tag = PacketType::from_u8(*buf.first()?)?;
        match tag {
            PacketType::Hello => HelloPacket::decode(buf).map(Self::Hello),
            PacketType::Welcome => WelcomePacket::decode(buf).map(Self::Welcome),
            PacketType::Ack => AckPacket::decode(buf).map(Self::Ack),
            PacketType::Data => DataPacket::decode(buf).map(Self::Data),
            PacketType::Command => CommandPacket::decode(buf).map(Self::Command),
            PacketType::Config => ConfigPacket::decode(buf).map(Self::Config),
            PacketType::Heartbeat => HeartbeatPacket::decode(buf).map(Self::Heartbeat),
        }
    }
}
