//! Gateway configuration parameters
//!
//! All tunable parameters for the LoRa gateway core.
//! Values can be overridden by the host application's settings store.

use serde::{Deserialize, Serialize};

/// Radio (P2P) parameters pushed to the modem at init and advertised to
/// nodes through Config packets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Carrier frequency in Hz (e.g. 868 MHz EU band)
    pub frequency_hz: u32,
    /// Spreading factor (7-12)
    pub spreading_factor: u8,
    /// Bandwidth code (0: 125 kHz, 1: 250 kHz, 2: 500 kHz)
    pub bandwidth: u8,
    /// Coding rate code (1: 4/5, 2: 4/6, 3: 4/7, 4: 4/8)
    pub coding_rate: u8,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// Preamble length in symbols
    pub preamble: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 868_000_000,
            spreading_factor: 7,
            bandwidth: 0,
            coding_rate: 1,
            tx_power_dbm: 14,
            preamble: 8,
        }
    }
}

/// Core gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Radio parameters
    pub radio: RadioConfig,

    // --- Discovery / pairing ---
    /// Default scan window duration (milliseconds)
    pub scan_duration_ms: u32,
    /// Time to wait for a Welcome-Ack before a pairing attempt fails (milliseconds)
    pub pairing_timeout_ms: u32,

    // --- Liveness ---
    /// A node with no Data/Heartbeat for this long is marked offline (milliseconds)
    pub offline_threshold_ms: u32,
    /// Interval between offline sweeps (milliseconds)
    pub sweep_interval_ms: u32,

    // --- Modem timing ---
    /// Time to wait for the modem's OK/ERROR after a transmit command (milliseconds)
    pub tx_timeout_ms: u32,
    /// Time to wait for OK after shorter mode-switch commands (milliseconds)
    pub cmd_timeout_ms: u32,
    /// A partial RX line older than this is discarded (milliseconds)
    pub rx_line_gap_ms: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            radio: RadioConfig::default(),

            // Discovery / pairing
            scan_duration_ms: 60_000,
            pairing_timeout_ms: 10_000,

            // Liveness
            offline_threshold_ms: 120_000,
            sweep_interval_ms: 5_000,

            // Modem timing
            tx_timeout_ms: 1_000,
            cmd_timeout_ms: 200,
            rx_line_gap_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = GatewayConfig::default();
        assert!(c.radio.frequency_hz > 100_000_000);
        assert!((7..=12).contains(&c.radio.spreading_factor));
        assert!(c.radio.bandwidth <= 2);
        assert!((1..=4).contains(&c.radio.coding_rate));
        assert!(c.scan_duration_ms > 0);
        assert!(c.pairing_timeout_ms > 0);
        assert!(c.tx_timeout_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = GatewayConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: GatewayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.radio.frequency_hz, c2.radio.frequency_hz);
        assert_eq!(c.radio.tx_power_dbm, c2.radio.tx_power_dbm);
        assert_eq!(c.pairing_timeout_ms, c2.pairing_timeout_ms);
        assert_eq!(c.offline_threshold_ms, c2.offline_threshold_ms);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = GatewayConfig::default();
        assert!(
            c.sweep_interval_ms < c.offline_threshold_ms,
            "sweep must run more often than the offline threshold"
        );
        assert!(
            c.cmd_timeout_ms <= c.tx_timeout_ms,
            "mode-switch waits should not exceed the transmit wait"
        );
        assert!(
            c.pairing_timeout_ms < c.scan_duration_ms,
            "a pairing attempt should fit inside one scan window"
        );
    }
}
