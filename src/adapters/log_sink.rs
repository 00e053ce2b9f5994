//! Event sink that forwards gateway events to the logger.
//!
//! The default sink for hosts with no uplink of their own. Real deployments
//! usually wrap this in a fan-out sink that also publishes to MQTT or a web
//! socket.

use log::{info, warn};

use crate::app::events::GatewayEvent;
use crate::app::ports::EventSink;

/// Logs every [`GatewayEvent`] at an appropriate level.
#[derive(Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &GatewayEvent) {
        match event {
            GatewayEvent::NodeDiscovered(node) => {
                info!(
                    "discovered {} (type {:#04x}, fw {:#04x}, rssi {})",
                    node.mac, node.device_type, node.fw_version, node.rssi
                );
            }
            GatewayEvent::NodeData { node_id, data } => {
                info!(
                    "node {node_id}: relays {:#010b}, battery {}, up {}s",
                    data.relay_status, data.battery_level, data.uptime_secs
                );
            }
            GatewayEvent::PairingComplete { node_id, success } => {
                if *success {
                    info!("node {node_id} paired");
                } else {
                    warn!("pairing with node {node_id} failed");
                }
            }
            GatewayEvent::ScanFinished { discovered } => {
                info!("scan finished, {discovered} nodes discovered");
            }
            GatewayEvent::NodeOffline { node_id } => {
                warn!("node {node_id} offline");
            }
        }
    }
}
