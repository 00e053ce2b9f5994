//! Property-based checks for the wire codecs and registry invariants.

use proptest::prelude::*;

use relaygate::protocol::{
    AckPacket, CommandPacket, ConfigPacket, DataPacket, HeartbeatPacket, HelloPacket, MacAddr,
    MAX_PACKET_SIZE, NODE_ID_BROADCAST, NODE_ID_UNASSIGNED, Packet, WelcomePacket,
};
use relaygate::registry::{DeviceRegistry, MAX_REGISTERED_NODES, RegisteredNode};

// ---------------------------------------------------------------------------
// MAC formatting
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn mac_display_parse_roundtrip(bytes in any::<[u8; 6]>()) {
        let mac = MacAddr(bytes);
        let text = mac.to_string();
        prop_assert_eq!(MacAddr::parse(&text), Some(mac));
    }

    #[test]
    fn mac_parse_never_panics(s in "\\PC{0,32}") {
        let _ = MacAddr::parse(&s);
    }
}

// ---------------------------------------------------------------------------
// Packet codecs
// ---------------------------------------------------------------------------

proptest! {
    /// Arbitrary bytes never panic the dispatcher, and any successful decode
    /// implies the buffer carried at least that packet's fixed size.
    #[test]
    fn decode_arbitrary_bytes_is_total(buf in proptest::collection::vec(any::<u8>(), 0..64)) {
        if let Some(packet) = Packet::decode(&buf) {
            let size = match packet {
                Packet::Hello(_) => HelloPacket::SIZE,
                Packet::Welcome(_) => WelcomePacket::SIZE,
                Packet::Ack(_) => AckPacket::SIZE,
                Packet::Data(_) => DataPacket::SIZE,
                Packet::Command(_) => CommandPacket::SIZE,
                Packet::Config(_) => ConfigPacket::SIZE,
                Packet::Heartbeat(_) => HeartbeatPacket::SIZE,
            };
            prop_assert!(buf.len() >= size);
        }
    }

    /// The full-status packet survives the wire for every field combination,
    /// including the signed link-quality fields.
    #[test]
    fn data_packet_roundtrips(
        node_id in any::<u8>(),
        relay_status in any::<u8>(),
        rssi in any::<i8>(),
        snr in any::<i8>(),
        battery_level in any::<u8>(),
        uptime_secs in any::<u32>(),
    ) {
        let pkt = DataPacket { node_id, relay_status, rssi, snr, battery_level, uptime_secs };
        let buf = pkt.encode();
        prop_assert!(buf.len() <= MAX_PACKET_SIZE);
        prop_assert_eq!(Packet::decode(&buf), Some(Packet::Data(pkt)));
    }

    /// Radio parameter pushes carry multi-byte fields; every combination
    /// must land intact.
    #[test]
    fn config_packet_roundtrips(
        target_id in any::<u8>(),
        frequency_hz in any::<u32>(),
        spreading_factor in any::<u8>(),
        bandwidth in any::<u8>(),
        coding_rate in any::<u8>(),
        tx_power_dbm in any::<i8>(),
        preamble in any::<u16>(),
    ) {
        let pkt = ConfigPacket {
            target_id, frequency_hz, spreading_factor,
            bandwidth, coding_rate, tx_power_dbm, preamble,
        };
        prop_assert_eq!(ConfigPacket::decode(&pkt.encode()), Some(pkt));
    }
}

// ---------------------------------------------------------------------------
// Registry invariants under churn
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Pair([u8; 6]),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<[u8; 6]>().prop_map(Op::Pair),
        any::<u8>().prop_map(Op::Remove),
    ]
}

proptest! {
    /// However pairing and removal interleave, the registry never holds a
    /// duplicate ID or MAC, never exceeds capacity, and never hands out the
    /// reserved IDs.
    #[test]
    fn registry_invariants_hold_under_churn(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let mut reg = DeviceRegistry::new();

        for op in ops {
            match op {
                Op::Pair(mac_bytes) => {
                    let mac = MacAddr(mac_bytes);
                    if reg.contains_mac(&mac) {
                        continue;
                    }
                    if let Some(id) = reg.next_free_id() {
                        prop_assert_ne!(id, NODE_ID_UNASSIGNED);
                        prop_assert_ne!(id, NODE_ID_BROADCAST);
                        // Table may be full even when an ID is free.
                        let _ = reg.add(RegisteredNode::paired(id, mac, 1, 0));
                    }
                }
                Op::Remove(id) => {
                    let _ = reg.remove(id);
                }
            }

            prop_assert!(reg.len() <= MAX_REGISTERED_NODES);
            for node in reg.iter() {
                prop_assert!((1..=254).contains(&node.node_id));
                let same_id = reg.iter().filter(|n| n.node_id == node.node_id).count();
                let same_mac = reg.iter().filter(|n| n.mac == node.mac).count();
                prop_assert_eq!(same_id, 1);
                prop_assert_eq!(same_mac, 1);
            }
        }
    }
}
