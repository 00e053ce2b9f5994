//! The gateway service: discovery, pairing, command dispatch, liveness.
//!
//! One `update()` call per host loop iteration does everything: pump modem
//! bytes through the line assembler, decode and dispatch inbound packets,
//! expire the pairing deadline and the scan window, and run the periodic
//! offline sweep. Nothing here blocks beyond the modem driver's bounded
//! command waits.
//!
//! The service is the only writer of the registry, scan list and pairing
//! session, which is what makes the whole core single-threaded by
//! construction — the host must not call in from a second thread.

use log::{debug, info, warn};

use crate::app::events::GatewayEvent;
use crate::app::ports::{Clock, EventSink, NodeStorePort, PersistedNode};
use crate::config::{GatewayConfig, RadioConfig};
use crate::error::{PairingError, RegistryError, Result, StoreError};
use crate::link::framing::{LineAssembler, RadioFrame, parse_rx_notification};
use crate::link::modem::AtModem;
use crate::link::transport::Transport;
use crate::pairing::{PairingOutcome, PairingResult, PairingSession, PairingState};
use crate::protocol::{
    AckPacket, AckStatus, CommandPacket, CommandType, ConfigPacket, DataPacket, HeartbeatPacket,
    HelloPacket, MacAddr, NODE_ID_BROADCAST, Packet, WelcomePacket,
};
use crate::registry::{DEFAULT_DEVICE_TYPE, DeviceRegistry, RegisteredNode};
use crate::scan::{DiscoveredNode, HelloRejected, ScanController};

/// The gateway core. Owns the radio link and every piece of session state;
/// generic over the host-provided ports.
pub struct GatewayService<T, C, E, S>
where
    T: Transport,
    C: Clock,
    E: EventSink,
    S: NodeStorePort,
{
    config: GatewayConfig,
    link: T,
    clock: C,
    events: E,
    store: S,
    modem: AtModem,
    assembler: LineAssembler,
    registry: DeviceRegistry,
    scan: ScanController,
    pairing: PairingSession,
    last_sweep_ms: u64,
}

impl<T, C, E, S> GatewayService<T, C, E, S>
where
    T: Transport,
    C: Clock,
    E: EventSink,
    S: NodeStorePort,
{
    pub fn new(config: GatewayConfig, link: T, clock: C, events: E, store: S) -> Self {
        let modem = AtModem::new(&config);
        Self {
            config,
            link,
            clock,
            events,
            store,
            modem,
            assembler: LineAssembler::new(),
            registry: DeviceRegistry::new(),
            scan: ScanController::new(),
            pairing: PairingSession::new(),
            last_sweep_ms: 0,
        }
    }

    /// Bring the gateway up: reload persisted nodes, then initialize the
    /// modem. Returns `false` only when the modem never answers — a missing
    /// or corrupt node store is not a startup failure.
    pub fn init(&mut self) -> bool {
        self.load_nodes();
        let radio = self.config.radio;
        let ok = self.modem.init(&mut self.link, &self.clock, &radio);
        self.last_sweep_ms = self.clock.now_ms();
        ok
    }

    /// One cooperative tick. Call from the host loop, as often as possible.
    pub fn update(&mut self) {
        let now = self.clock.now_ms();

        self.assembler
            .expire(now, u64::from(self.config.rx_line_gap_ms));
        self.pump_rx(now);

        if let Some(result) = self
            .pairing
            .check_timeout(now, u64::from(self.config.pairing_timeout_ms))
        {
            self.finish_pairing(result);
        }

        if self.scan.tick(now) {
            self.events.emit(&GatewayEvent::ScanFinished {
                discovered: self.scan.discovered().len(),
            });
        }

        if now.saturating_sub(self.last_sweep_ms) >= u64::from(self.config.sweep_interval_ms) {
            self.last_sweep_ms = now;
            let threshold = u64::from(self.config.offline_threshold_ms);
            for node_id in self.registry.sweep_offline(now, threshold) {
                self.events.emit(&GatewayEvent::NodeOffline { node_id });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Inbound path
    // -----------------------------------------------------------------------

    fn pump_rx(&mut self, now_ms: u64) {
        let mut chunk = [0u8; 32];
        while self.link.available() {
            let n = match self.link.read(&mut chunk) {
                Ok(n) if n > 0 => n,
                _ => break,
            };
            for &byte in &chunk[..n] {
                if let Some(line) = self.assembler.push(byte, now_ms) {
                    self.handle_line(&line, now_ms);
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str, now_ms: u64) {
        match parse_rx_notification(line) {
            Some(frame) => self.dispatch(&frame, now_ms),
            // Unsolicited modem chatter (TX done, echoes) outside a command
            // wait is uninteresting.
            None => debug!("link: {line}"),
        }
    }

    fn dispatch(&mut self, frame: &RadioFrame, now_ms: u64) {
        let Some(packet) = Packet::decode(&frame.payload) else {
            debug!("dropping undecodable frame ({} bytes)", frame.payload.len());
            return;
        };
        match packet {
            Packet::Hello(hello) => self.on_hello(&hello, frame.rssi, frame.snr, now_ms),
            Packet::Ack(ack) => self.on_ack(&ack),
            Packet::Data(data) => self.on_data(&data, frame.rssi, frame.snr, now_ms),
            Packet::Heartbeat(hb) => self.on_heartbeat(&hb, frame.rssi, frame.snr, now_ms),
            // Gateway-originated types reflected back at us (self-reception
            // or a misbehaving node) are dropped.
            Packet::Welcome(_) | Packet::Command(_) | Packet::Config(_) => {
                debug!("ignoring gateway-originated packet type");
            }
        }
    }

    fn on_hello(&mut self, hello: &HelloPacket, rssi: i8, snr: i8, now_ms: u64) {
        let registered = self.registry.contains_mac(&hello.mac);
        match self.scan.offer_hello(hello, rssi, snr, now_ms, registered) {
            Ok(node) => self.events.emit(&GatewayEvent::NodeDiscovered(node)),
            Err(HelloRejected::NotScanning) => debug!("hello from {} outside scan", hello.mac),
            Err(HelloRejected::Duplicate) => {}
            Err(HelloRejected::AlreadyRegistered) => {
                debug!("registered node {} re-announced", hello.mac);
            }
            Err(HelloRejected::ListFull) => {}
        }
    }

    fn on_ack(&mut self, ack: &AckPacket) {
        if let Some(result) = self.pairing.on_ack(ack) {
            self.finish_pairing(result);
            return;
        }
        // Command acks are uncorrelated: logged, never awaited.
        if AckStatus::is_ok(ack.status) {
            info!("node {} acked type {:#04x}", ack.node_id, ack.ack_type);
        } else {
            warn!(
                "node {} nacked type {:#04x} (status {})",
                ack.node_id, ack.ack_type, ack.status
            );
        }
    }

    fn on_data(&mut self, data: &DataPacket, rssi: i8, snr: i8, now_ms: u64) {
        let Some(node) = self.registry.node_by_id_mut(data.node_id) else {
            debug!("data from unknown node {}", data.node_id);
            return;
        };
        node.relay_status = data.relay_status;
        node.uptime_secs = data.uptime_secs;
        node.last_rssi = rssi;
        node.last_snr = snr;
        node.last_seen_ms = now_ms;
        node.online = true;
        self.events.emit(&GatewayEvent::NodeData {
            node_id: data.node_id,
            data: *data,
        });
    }

    fn on_heartbeat(&mut self, hb: &HeartbeatPacket, rssi: i8, snr: i8, now_ms: u64) {
        let Some(node) = self.registry.node_by_id_mut(hb.node_id) else {
            debug!("heartbeat from unknown node {}", hb.node_id);
            return;
        };
        node.relay_status = hb.relay_status;
        node.last_rssi = rssi;
        node.last_snr = snr;
        node.last_seen_ms = now_ms;
        node.online = true;
        if hb.error_flags != 0 {
            warn!(
                "node {} reports error flags {:#04x}",
                hb.node_id, hb.error_flags
            );
        }
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    /// Open a scan window of the configured default duration.
    pub fn start_scan(&mut self) {
        let duration = u64::from(self.config.scan_duration_ms);
        self.start_scan_for(duration);
    }

    /// Open a scan window of an explicit duration.
    pub fn start_scan_for(&mut self, duration_ms: u64) {
        self.scan.start(self.clock.now_ms(), duration_ms);
    }

    /// Close the scan window early. No-op when not scanning.
    pub fn stop_scan(&mut self) {
        if self.scan.is_scanning() {
            self.scan.stop();
            self.events.emit(&GatewayEvent::ScanFinished {
                discovered: self.scan.discovered().len(),
            });
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.is_scanning()
    }

    /// Nodes found in the current (or last) scan window.
    pub fn discovered(&self) -> &[DiscoveredNode] {
        self.scan.discovered()
    }

    // -----------------------------------------------------------------------
    // Pairing
    // -----------------------------------------------------------------------

    /// Start pairing with `mac`: allocate an ID, open the session and send
    /// the Welcome. Returns the assigned ID.
    ///
    /// A transmit failure still returns the error but leaves the session
    /// open — the frame may have left the antenna anyway, so either the
    /// node's Ack or the pairing timeout settles it.
    pub fn start_pairing(&mut self, mac: MacAddr) -> Result<u8> {
        if !self.pairing.is_idle() {
            return Err(PairingError::Busy.into());
        }
        if self.registry.contains_mac(&mac) {
            return Err(PairingError::AlreadyRegistered.into());
        }
        let node_id = self.registry.next_free_id().ok_or(PairingError::NoFreeId)?;

        self.pairing.begin(mac, node_id, self.clock.now_ms())?;

        let welcome = WelcomePacket {
            target_mac: mac,
            assigned_id: node_id,
        };
        self.modem
            .transmit(&mut self.link, &self.clock, &welcome.encode())?;
        Ok(node_id)
    }

    /// Abort the in-flight pairing session, if any. No event is emitted.
    pub fn cancel_pairing(&mut self) {
        self.pairing.cancel();
    }

    pub fn pairing_state(&self) -> PairingState {
        self.pairing.state()
    }

    fn finish_pairing(&mut self, result: PairingResult) {
        let success = match result.outcome {
            PairingOutcome::Success => {
                let device_type = self
                    .scan
                    .device_type_for(&result.mac)
                    .unwrap_or(DEFAULT_DEVICE_TYPE);
                let node = RegisteredNode::paired(
                    result.node_id,
                    result.mac,
                    device_type,
                    self.clock.now_ms(),
                );
                match self.registry.add(node) {
                    Ok(()) => {
                        if let Err(e) = self.save_nodes() {
                            warn!("node save after pairing failed: {e}");
                        }
                        true
                    }
                    Err(e) => {
                        // ID or MAC got taken while the session was open.
                        warn!("registering paired node {} failed: {e}", result.node_id);
                        false
                    }
                }
            }
            PairingOutcome::Failed | PairingOutcome::Timeout => false,
        };
        self.events.emit(&GatewayEvent::PairingComplete {
            node_id: result.node_id,
            success,
        });
    }

    // -----------------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------------

    /// Set a node's full relay bitmap.
    pub fn send_relay_command(&mut self, target_id: u8, bitmap: u8) -> Result<()> {
        self.send_command(target_id, CommandType::RelaySet, bitmap, 0)
    }

    /// Toggle one relay (1-based channel number).
    pub fn send_relay_toggle(&mut self, target_id: u8, relay_num: u8) -> Result<()> {
        self.send_command(target_id, CommandType::RelayToggle, relay_num, 0)
    }

    /// Ask a node for an immediate Data report.
    pub fn request_node_status(&mut self, target_id: u8) -> Result<()> {
        self.send_command(target_id, CommandType::RequestStatus, 0, 0)
    }

    /// Soft-reset a node.
    pub fn send_reset_command(&mut self, target_id: u8) -> Result<()> {
        self.send_command(target_id, CommandType::Reset, 0, 0)
    }

    /// Restore a node to factory defaults. The node forgets its ID; remove
    /// it from the registry separately if it should not re-pair.
    pub fn send_factory_reset(&mut self, target_id: u8) -> Result<()> {
        self.send_command(target_id, CommandType::FactoryReset, 0, 0)
    }

    fn send_command(
        &mut self,
        target_id: u8,
        cmd_type: CommandType,
        param1: u8,
        param2: u8,
    ) -> Result<()> {
        if target_id != NODE_ID_BROADCAST && self.registry.node_by_id(target_id).is_none() {
            return Err(RegistryError::UnknownNode.into());
        }
        let packet = CommandPacket {
            target_id,
            cmd_type: cmd_type as u8,
            param1,
            param2,
        };
        self.modem
            .transmit(&mut self.link, &self.clock, &packet.encode())?;
        debug!("command {:#04x} sent to {target_id}", packet.cmd_type);
        Ok(())
    }

    /// Push radio parameters to a node (or broadcast). The node applies them
    /// after acking, so the gateway's own radio settings stay untouched here.
    pub fn send_radio_config(&mut self, target_id: u8, radio: &RadioConfig) -> Result<()> {
        if target_id != NODE_ID_BROADCAST && self.registry.node_by_id(target_id).is_none() {
            return Err(RegistryError::UnknownNode.into());
        }
        let packet = ConfigPacket {
            target_id,
            frequency_hz: radio.frequency_hz,
            spreading_factor: radio.spreading_factor,
            bandwidth: radio.bandwidth,
            coding_rate: radio.coding_rate,
            tx_power_dbm: radio.tx_power_dbm,
            preamble: radio.preamble,
        };
        self.modem
            .transmit(&mut self.link, &self.clock, &packet.encode())?;
        info!("radio config sent to {target_id}");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Registry access
    // -----------------------------------------------------------------------

    pub fn node(&self, node_id: u8) -> Option<&RegisteredNode> {
        self.registry.node_by_id(node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RegisteredNode> {
        self.registry.iter()
    }

    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    pub fn online_count(&self) -> usize {
        self.registry.online_count()
    }

    /// Unregister a node and persist the change. Returns `false` when the ID
    /// was not registered. An in-flight pairing session is unaffected — its
    /// target is by definition not in the registry yet.
    pub fn remove_node(&mut self, node_id: u8) -> bool {
        if !self.registry.remove(node_id) {
            return false;
        }
        if let Err(e) = self.save_nodes() {
            warn!("node save after removal failed: {e}");
        }
        true
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the current registry to the node store.
    pub fn save_nodes(&mut self) -> Result<()> {
        let mut out = Vec::with_capacity(self.registry.len());
        for node in self.registry.iter() {
            out.push(PersistedNode {
                id: node.node_id,
                mac: node.mac.to_string(),
                device_type: node.device_type,
                name: node.name.as_str().into(),
            });
        }
        self.store.save(&out)?;
        debug!("saved {} nodes", out.len());
        Ok(())
    }

    /// Reload the registry from the node store. Best-effort: a missing store
    /// is first boot, a corrupt one is logged and ignored. Records with an
    /// unparseable MAC are skipped individually.
    pub fn load_nodes(&mut self) {
        match self.store.load() {
            Ok(persisted) => {
                let nodes = persisted.iter().filter_map(|p| match MacAddr::parse(&p.mac) {
                    Some(mac) => Some(RegisteredNode::loaded(p.id, mac, p.device_type, &p.name)),
                    None => {
                        warn!("skipping stored node {} with bad MAC {:?}", p.id, p.mac);
                        None
                    }
                });
                self.registry.replace_all(nodes);
                info!("loaded {} registered nodes", self.registry.len());
            }
            Err(StoreError::NotFound) => info!("no saved nodes, starting empty"),
            Err(e) => warn!("node load failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LinkError};
    use crate::protocol::PacketType;
    use crate::scan::MAX_DISCOVERED_NODES;
    use core::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Shared-handle transport: every written line is auto-acked with `OK`,
    /// and tests inject inbound lines through a cloned handle.
    #[derive(Clone, Default)]
    struct TestLink(Rc<RefCell<LinkInner>>);

    #[derive(Default)]
    struct LinkInner {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        mute: bool,
    }

    impl TestLink {
        /// Stop auto-acking writes, simulating an unresponsive modem.
        fn mute(&self) {
            self.0.borrow_mut().mute = true;
        }

        fn inject_line(&self, line: &str) {
            let mut inner = self.0.borrow_mut();
            inner.rx.extend(line.as_bytes());
            inner.rx.extend(b"\r\n");
        }

        fn inject_packet(&self, rssi: i8, snr: i8, payload: &[u8]) {
            let mut line = std::string::String::from("+EVT:RXP2P:");
            line.push_str(&format!("{rssi}:{snr}:"));
            for b in payload {
                line.push_str(&format!("{b:02X}"));
            }
            self.inject_line(&line);
        }

        fn sent(&self) -> std::string::String {
            std::string::String::from_utf8_lossy(&self.0.borrow().tx).into_owned()
        }
    }

    impl Transport for TestLink {
        type Error = ();

        fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, ()> {
            let mut inner = self.0.borrow_mut();
            let mut n = 0;
            while n < buf.len() {
                match inner.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn write(&mut self, data: &[u8]) -> core::result::Result<usize, ()> {
            let mut inner = self.0.borrow_mut();
            inner.tx.extend_from_slice(data);
            if !inner.mute && data.contains(&b'\n') {
                inner.rx.extend(b"OK\r\n");
            }
            Ok(data.len())
        }

        fn available(&self) -> bool {
            !self.0.borrow().rx.is_empty()
        }
    }

    /// Manually advanced clock shared between test and service.
    #[derive(Clone, Default)]
    struct FakeClock(Rc<Cell<u64>>);

    impl FakeClock {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Vec<GatewayEvent>>>);

    impl RecordingSink {
        fn take(&self) -> Vec<GatewayEvent> {
            self.0.borrow_mut().drain(..).collect()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&mut self, event: &GatewayEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    #[derive(Clone, Default)]
    struct MemStore(Rc<RefCell<Option<Vec<PersistedNode>>>>);

    impl NodeStorePort for MemStore {
        fn save(&mut self, nodes: &[PersistedNode]) -> core::result::Result<(), StoreError> {
            *self.0.borrow_mut() = Some(nodes.to_vec());
            Ok(())
        }

        fn load(&self) -> core::result::Result<Vec<PersistedNode>, StoreError> {
            self.0.borrow().clone().ok_or(StoreError::NotFound)
        }
    }

    struct Harness {
        service: GatewayService<TestLink, FakeClock, RecordingSink, MemStore>,
        link: TestLink,
        clock: FakeClock,
        events: RecordingSink,
        store: MemStore,
    }

    fn harness() -> Harness {
        let link = TestLink::default();
        let clock = FakeClock::default();
        let events = RecordingSink::default();
        let store = MemStore::default();
        let service = GatewayService::new(
            GatewayConfig::default(),
            link.clone(),
            clock.clone(),
            events.clone(),
            store.clone(),
        );
        Harness {
            service,
            link,
            clock,
            events,
            store,
        }
    }

    const MAC: MacAddr = MacAddr([0xAA, 0xBB, 0xCC, 0x11, 0x22, 0x33]);

    fn hello_from(mac: MacAddr) -> HelloPacket {
        HelloPacket {
            mac,
            device_type: 0x01,
            fw_version: 0x10,
        }
    }

    fn pair(h: &mut Harness, mac: MacAddr) -> u8 {
        let id = h.service.start_pairing(mac).unwrap();
        let ack = AckPacket {
            node_id: id,
            ack_type: PacketType::Welcome as u8,
            status: 0,
        };
        h.link.inject_packet(-40, 7, &ack.encode());
        h.service.update();
        id
    }

    #[test]
    fn hello_during_scan_emits_discovery_event() {
        let mut h = harness();
        h.service.start_scan();
        h.link.inject_packet(-45, 8, &hello_from(MAC).encode());
        h.service.update();

        let events = h.events.take();
        assert!(matches!(
            events.as_slice(),
            [GatewayEvent::NodeDiscovered(n)] if n.mac == MAC && n.rssi == -45
        ));
        assert_eq!(h.service.discovered().len(), 1);
    }

    #[test]
    fn hello_outside_scan_is_dropped() {
        let mut h = harness();
        h.link.inject_packet(-45, 8, &hello_from(MAC).encode());
        h.service.update();
        assert!(h.events.take().is_empty());
        assert!(h.service.discovered().is_empty());
    }

    #[test]
    fn scan_window_closes_with_event() {
        let mut h = harness();
        h.service.start_scan_for(1_000);
        h.clock.advance(999);
        h.service.update();
        assert!(h.service.is_scanning());

        h.clock.advance(1);
        h.service.update();
        assert!(!h.service.is_scanning());
        let events = h.events.take();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GatewayEvent::ScanFinished { .. }))
        );
    }

    #[test]
    fn pairing_success_registers_persists_and_notifies() {
        let mut h = harness();
        h.service.start_scan();
        h.link.inject_packet(-45, 8, &hello_from(MAC).encode());
        h.service.update();
        h.events.take();

        let id = pair(&mut h, MAC);
        assert_eq!(id, 1);

        assert!(h.link.sent().contains("AT+PSEND=02"), "welcome went out");
        let node = h.service.node(id).unwrap();
        assert_eq!(node.mac, MAC);
        assert!(node.online);

        let events = h.events.take();
        assert!(matches!(
            events.as_slice(),
            [GatewayEvent::PairingComplete { node_id: 1, success: true }]
        ));

        let saved = h.store.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].mac, "AA:BB:CC:11:22:33");
    }

    #[test]
    fn pairing_timeout_reports_failure() {
        let mut h = harness();
        h.service.start_pairing(MAC).unwrap();
        h.clock.advance(10_000);
        h.service.update();

        assert_eq!(h.service.pairing_state(), PairingState::Idle);
        assert_eq!(h.service.node_count(), 0);
        let events = h.events.take();
        assert!(matches!(
            events.as_slice(),
            [GatewayEvent::PairingComplete { success: false, .. }]
        ));
    }

    #[test]
    fn pairing_rejects_registered_mac_and_busy() {
        let mut h = harness();
        pair(&mut h, MAC);

        assert_eq!(
            h.service.start_pairing(MAC),
            Err(Error::Pairing(PairingError::AlreadyRegistered))
        );

        let other = MacAddr([1, 2, 3, 4, 5, 6]);
        h.service.start_pairing(other).unwrap();
        let third = MacAddr([9, 9, 9, 9, 9, 9]);
        assert_eq!(
            h.service.start_pairing(third),
            Err(Error::Pairing(PairingError::Busy))
        );
    }

    #[test]
    fn command_to_unknown_node_is_rejected_locally() {
        let mut h = harness();
        let before = h.link.sent().len();
        assert_eq!(
            h.service.send_relay_command(9, 0b01),
            Err(Error::Registry(RegistryError::UnknownNode))
        );
        assert_eq!(h.link.sent().len(), before, "nothing transmitted");
    }

    #[test]
    fn broadcast_command_skips_registry_check() {
        let mut h = harness();
        h.service.send_relay_command(NODE_ID_BROADCAST, 0).unwrap();
        assert!(h.link.sent().contains("AT+PSEND=05FF010000"));
    }

    #[test]
    fn data_ingestion_updates_node_and_emits() {
        let mut h = harness();
        let id = pair(&mut h, MAC);
        h.events.take();

        let data = DataPacket {
            node_id: id,
            relay_status: 0b11,
            rssi: -70,
            snr: 5,
            battery_level: 80,
            uptime_secs: 3_600,
        };
        h.clock.advance(1_000);
        h.link.inject_packet(-52, 6, &data.encode());
        h.service.update();

        let node = h.service.node(id).unwrap();
        assert_eq!(node.relay_status, 0b11);
        assert_eq!(node.uptime_secs, 3_600);
        assert_eq!(node.last_rssi, -52, "gateway-side measurement wins");
        assert_eq!(node.last_seen_ms, 1_000);

        let events = h.events.take();
        assert!(matches!(
            events.as_slice(),
            [GatewayEvent::NodeData { node_id, data: d }] if *node_id == id && d.battery_level == 80
        ));
    }

    #[test]
    fn data_from_unknown_node_is_dropped() {
        let mut h = harness();
        let data = DataPacket {
            node_id: 42,
            relay_status: 0,
            rssi: 0,
            snr: 0,
            battery_level: 0,
            uptime_secs: 0,
        };
        h.link.inject_packet(-50, 5, &data.encode());
        h.service.update();
        assert!(h.events.take().is_empty());
    }

    #[test]
    fn offline_sweep_emits_and_recovery_goes_quiet() {
        let mut h = harness();
        let id = pair(&mut h, MAC);
        h.events.take();

        // Past the threshold and a sweep interval.
        h.clock.advance(125_000);
        h.service.update();
        let events = h.events.take();
        assert!(matches!(
            events.as_slice(),
            [GatewayEvent::NodeOffline { node_id }] if *node_id == id
        ));
        assert!(!h.service.node(id).unwrap().online);

        // A heartbeat brings it back; the next sweep stays silent.
        let hb = HeartbeatPacket {
            node_id: id,
            relay_status: 0,
            error_flags: 0,
            seq_num: 1,
        };
        h.link.inject_packet(-60, 4, &hb.encode());
        h.service.update();
        assert!(h.service.node(id).unwrap().online);

        h.clock.advance(5_000);
        h.service.update();
        assert!(h.events.take().is_empty());
    }

    #[test]
    fn remove_node_persists_and_frees_id() {
        let mut h = harness();
        let id = pair(&mut h, MAC);
        assert!(h.service.remove_node(id));
        assert!(!h.service.remove_node(id));
        assert_eq!(h.service.node_count(), 0);
        assert!(h.store.load().unwrap().is_empty());

        // The freed ID is handed out again.
        let next = pair(&mut h, MacAddr([5, 5, 5, 5, 5, 5]));
        assert_eq!(next, id);
    }

    #[test]
    fn load_nodes_restores_offline_registry() {
        let mut h = harness();
        h.store
            .save(&[
                PersistedNode {
                    id: 2,
                    mac: "AA:BB:CC:11:22:33".into(),
                    device_type: 1,
                    name: "Garage".into(),
                },
                PersistedNode {
                    id: 3,
                    mac: "not-a-mac".into(),
                    device_type: 1,
                    name: "Broken".into(),
                },
            ])
            .unwrap();

        h.service.load_nodes();
        assert_eq!(h.service.node_count(), 1, "bad MAC record skipped");
        let node = h.service.node(2).unwrap();
        assert_eq!(node.name.as_str(), "Garage");
        assert!(!node.online);
    }

    #[test]
    fn discovery_list_never_exceeds_cap() {
        let mut h = harness();
        h.service.start_scan();
        for i in 0..(MAX_DISCOVERED_NODES + 4) as u8 {
            let hello = hello_from(MacAddr([0x02, 0, 0, 0, 0, i]));
            h.link.inject_packet(-50, 5, &hello.encode());
        }
        h.service.update();
        assert_eq!(h.service.discovered().len(), MAX_DISCOVERED_NODES);
    }

    #[test]
    fn transmit_failure_leaves_pairing_recoverable() {
        let h = harness();
        // Zero modem timeouts make every wait expire immediately, so a muted
        // link reports a transmit timeout even with a frozen clock.
        let config = GatewayConfig {
            tx_timeout_ms: 0,
            cmd_timeout_ms: 0,
            ..GatewayConfig::default()
        };
        let mut service = GatewayService::new(
            config,
            h.link.clone(),
            h.clock.clone(),
            h.events.clone(),
            h.store.clone(),
        );
        h.link.mute();

        let err = service.start_pairing(MAC).unwrap_err();
        assert_eq!(err, Error::Link(LinkError::TxTimeout));
        // Session stays open for the ack-or-timeout race to settle.
        assert_eq!(service.pairing_state(), PairingState::WaitingAck);

        h.clock.advance(10_000);
        service.update();
        assert_eq!(service.pairing_state(), PairingState::Idle);
    }
}
