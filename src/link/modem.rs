//! AT-command modem driver.
//!
//! Drives a RAK-style LoRa P2P modem over a byte [`Transport`]:
//!
//! - bring-up: P2P mode plus frequency/SF/BW/CR/power/preamble, then
//!   continuous receive (`AT+PRECV=65534`)
//! - transmit: the half-duplex dance — stop receive, send the payload as
//!   uppercase hex, wait for the modem's OK/ERROR, resume receive
//!
//! The modem cannot receive while transmitting, so the resume step runs
//! unconditionally; a failed transmit must never leave the radio deaf.
//!
//! All waits are deadline comparisons against the injected [`Clock`], bounded
//! by the configured timeouts. There is no retry at this layer — the caller
//! decides whether a failed transmit matters.

use core::fmt::Write as _;

use heapless::String;
use log::{debug, info, warn};

use crate::app::ports::Clock;
use crate::config::{GatewayConfig, RadioConfig};
use crate::error::LinkError;
use crate::link::framing::{LineAssembler, encode_hex};
use crate::link::transport::Transport;
use crate::protocol::MAX_PACKET_SIZE;

/// Largest AT command we build: `AT+PSEND=` + 64 hex chars.
const CMD_BUF_SIZE: usize = 16 + MAX_PACKET_SIZE * 2;

/// Continuous-receive argument for `AT+PRECV` (modem-defined magic value).
const RX_CONTINUOUS: &str = "65534";

/// Outcome of a bounded wait for a modem response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Ok,
    Error,
    Timeout,
}

/// Stateless driver for the AT modem; timing knobs come from config.
pub struct AtModem {
    cmd_timeout_ms: u64,
    tx_timeout_ms: u64,
}

impl AtModem {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            cmd_timeout_ms: u64::from(config.cmd_timeout_ms),
            tx_timeout_ms: u64::from(config.tx_timeout_ms),
        }
    }

    /// Run the bring-up sequence.
    ///
    /// Returns `false` only if the modem never answers the `AT` ping;
    /// individual parameter commands that time out are logged and skipped
    /// (the modem keeps its previous setting).
    pub fn init<T: Transport>(
        &self,
        link: &mut T,
        clock: &impl Clock,
        radio: &RadioConfig,
    ) -> bool {
        info!("modem: initializing");

        // Ping until the module answers anything at all.
        let mut alive = false;
        for _ in 0..10 {
            self.send_line(link, "AT");
            if self.wait_response(link, clock, self.cmd_timeout_ms) != WaitOutcome::Timeout {
                alive = true;
                break;
            }
        }
        if !alive {
            warn!("modem: no response to AT ping");
            return false;
        }
        drain(link);

        // P2P mode, then radio parameters.
        let mut cmd: String<CMD_BUF_SIZE> = String::new();
        let _ = write!(cmd, "AT+NWM=0");
        self.command(link, clock, &cmd);

        for (name, value) in [
            ("PFREQ", i64::from(radio.frequency_hz)),
            ("PSF", i64::from(radio.spreading_factor)),
            ("PBW", i64::from(radio.bandwidth)),
            ("PCR", i64::from(radio.coding_rate)),
            ("PTP", i64::from(radio.tx_power_dbm)),
            ("PPL", i64::from(radio.preamble)),
        ] {
            cmd.clear();
            let _ = write!(cmd, "AT+{name}={value}");
            self.command(link, clock, &cmd);
        }

        // Continuous receive.
        cmd.clear();
        let _ = write!(cmd, "AT+PRECV={RX_CONTINUOUS}");
        self.command(link, clock, &cmd);

        info!(
            "modem: ready ({} Hz, SF{})",
            radio.frequency_hz, radio.spreading_factor
        );
        true
    }

    /// Transmit one packet payload over the half-duplex link.
    ///
    /// Success only on the modem's explicit OK; a timeout or explicit ERROR
    /// is reported to the caller with no automatic retry. Receive is resumed
    /// in every path.
    pub fn transmit<T: Transport>(
        &self,
        link: &mut T,
        clock: &impl Clock,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        // Stale responses from earlier commands would confuse the OK wait.
        drain(link);

        // Stop receive before keying the transmitter.
        self.send_line(link, "AT+PRECV=0");
        if self.wait_response(link, clock, self.cmd_timeout_ms) == WaitOutcome::Timeout {
            debug!("modem: no ack for PRECV=0, transmitting anyway");
        }

        let mut cmd: String<CMD_BUF_SIZE> = String::new();
        let _ = write!(cmd, "AT+PSEND={}", encode_hex(payload));
        self.send_line(link, &cmd);

        let result = match self.wait_response(link, clock, self.tx_timeout_ms) {
            WaitOutcome::Ok => Ok(()),
            WaitOutcome::Error => Err(LinkError::TxRejected),
            WaitOutcome::Timeout => Err(LinkError::TxTimeout),
        };

        // Unconditional resume — never leave the radio deaf.
        cmd.clear();
        let _ = write!(cmd, "AT+PRECV={RX_CONTINUOUS}");
        self.send_line(link, &cmd);

        if let Err(e) = result {
            warn!("modem: transmit failed: {e}");
        }
        result
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Send a command and wait briefly for its acknowledgment; a timeout is
    /// tolerated (logged only).
    fn command<T: Transport>(&self, link: &mut T, clock: &impl Clock, cmd: &str) {
        self.send_line(link, cmd);
        if self.wait_response(link, clock, self.cmd_timeout_ms) != WaitOutcome::Ok {
            debug!("modem: no OK for {cmd}");
        }
    }

    fn send_line<T: Transport>(&self, link: &mut T, cmd: &str) {
        if link.write(cmd.as_bytes()).is_err() || link.write(b"\r\n").is_err() {
            warn!("modem: transport write failed");
        }
    }

    /// Read lines until one containing `OK` or `ERROR` arrives, or the
    /// deadline passes. Receive notifications cannot arrive here — RX is
    /// disabled or the modem is mid-command — so consuming lines is safe.
    fn wait_response<T: Transport>(
        &self,
        link: &mut T,
        clock: &impl Clock,
        timeout_ms: u64,
    ) -> WaitOutcome {
        let deadline = clock.now_ms().saturating_add(timeout_ms);
        let mut asm = LineAssembler::new();
        let mut chunk = [0u8; 32];

        loop {
            let now = clock.now_ms();
            match link.read(&mut chunk) {
                Ok(n) => {
                    for &b in &chunk[..n] {
                        if let Some(line) = asm.push(b, now) {
                            if line.contains("ERROR") {
                                return WaitOutcome::Error;
                            }
                            if line.contains("OK") {
                                return WaitOutcome::Ok;
                            }
                            // Echo or unrelated chatter; keep waiting.
                        }
                    }
                }
                Err(_) => return WaitOutcome::Error,
            }
            if clock.now_ms() >= deadline {
                return WaitOutcome::Timeout;
            }
        }
    }
}

/// Discard any buffered bytes.
fn drain<T: Transport>(link: &mut T) {
    let mut chunk = [0u8; 32];
    while link.available() {
        if !matches!(link.read(&mut chunk), Ok(n) if n > 0) {
            break;
        }
    }
}
