//! Wire framing: modem byte stream → lines → radio frames.
//!
//! The RAK-style modem talks newline-terminated ASCII. Two things come up
//! the wire: synchronous AT command echoes/acknowledgments, and asynchronous
//! receive notifications of the form
//!
//! ```text
//! +EVT:RXP2P:<rssi>:<snr>:<hexpayload>
//! ```
//!
//! This layer assembles CR/LF-delimited lines into a bounded buffer and
//! recognises the receive notification; everything else is left to whoever
//! is synchronously waiting on an AT response. A partial line that stalls
//! for longer than the configured gap is discarded — the usual recovery
//! after a glitched UART byte.

use heapless::{String, Vec};

use crate::protocol::MAX_PACKET_SIZE;

/// RX line buffer size. AT responses and notifications are far shorter;
/// anything longer is droppable noise.
pub const LINE_BUF_SIZE: usize = 256;

/// Asynchronous receive notification prefix.
pub const RX_NOTIFICATION_PREFIX: &str = "+EVT:RXP2P:";

/// A completed line, CR/LF stripped.
pub type Line = String<LINE_BUF_SIZE>;

// ---------------------------------------------------------------------------
// Line assembly
// ---------------------------------------------------------------------------

/// Accumulates modem bytes into CR/LF-delimited lines.
pub struct LineAssembler {
    buf: [u8; LINE_BUF_SIZE],
    len: usize,
    last_byte_ms: u64,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: [0; LINE_BUF_SIZE],
            len: 0,
            last_byte_ms: 0,
        }
    }

    /// Feed one byte. Returns a completed line when a terminator arrives on
    /// a non-empty buffer. Bytes beyond the buffer bound are dropped (the
    /// line itself survives, truncated). Non-UTF-8 lines are discarded.
    pub fn push(&mut self, byte: u8, now_ms: u64) -> Option<Line> {
        self.last_byte_ms = now_ms;

        if byte == b'\n' || byte == b'\r' {
            if self.len == 0 {
                return None;
            }
            let n = self.len;
            self.len = 0;
            let s = core::str::from_utf8(&self.buf[..n]).ok()?;
            let mut line = Line::new();
            line.push_str(s).ok()?;
            return Some(line);
        }

        if self.len < LINE_BUF_SIZE {
            self.buf[self.len] = byte;
            self.len += 1;
        }
        None
    }

    /// Discard a stale partial line: no terminator within `gap_ms` of the
    /// last received byte.
    pub fn expire(&mut self, now_ms: u64, gap_ms: u64) {
        if self.len > 0 && now_ms.saturating_sub(self.last_byte_ms) > gap_ms {
            log::debug!("framing: discarding {} stale bytes", self.len);
            self.len = 0;
        }
    }

    /// Bytes currently held in the partial-line buffer.
    pub fn pending(&self) -> usize {
        self.len
    }
}

// ---------------------------------------------------------------------------
// Receive notification
// ---------------------------------------------------------------------------

/// A decoded radio frame: payload plus gateway-side link quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioFrame {
    pub rssi: i8,
    pub snr: i8,
    pub payload: Vec<u8, MAX_PACKET_SIZE>,
}

/// Parse a `+EVT:RXP2P:<rssi>:<snr>:<hex>` line.
///
/// Malformed or empty notifications yield `None` and are dropped silently;
/// the link offers no integrity guarantee, so the next periodic report is
/// the retry.
pub fn parse_rx_notification(line: &str) -> Option<RadioFrame> {
    let rest = line.strip_prefix(RX_NOTIFICATION_PREFIX)?;
    let mut fields = rest.splitn(3, ':');

    let rssi = fields.next()?.trim().parse::<i16>().ok()?;
    let snr = fields.next()?.trim().parse::<i16>().ok()?;
    let payload = decode_hex(fields.next()?.trim())?;
    if payload.is_empty() {
        return None;
    }

    Some(RadioFrame {
        rssi: clamp_i8(rssi),
        snr: clamp_i8(snr),
        payload,
    })
}

fn clamp_i8(v: i16) -> i8 {
    v.clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8
}

// ---------------------------------------------------------------------------
// Hex codec
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes, capped at the radio MTU (excess bytes are
/// truncated, matching the modem's own payload cap). Odd-length or non-hex
/// input is malformed.
pub fn decode_hex(hex: &str) -> Option<Vec<u8, MAX_PACKET_SIZE>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::new();
    for pair in hex.as_bytes().chunks_exact(2) {
        if out.len() == MAX_PACKET_SIZE {
            break;
        }
        let s = core::str::from_utf8(pair).ok()?;
        let byte = u8::from_str_radix(s, 16).ok()?;
        let _ = out.push(byte);
    }
    Some(out)
}

/// Encode bytes as uppercase hex for the `AT+PSEND=` command.
pub fn encode_hex(data: &[u8]) -> String<{ MAX_PACKET_SIZE * 2 }> {
    let mut out = String::new();
    for &b in data.iter().take(MAX_PACKET_SIZE) {
        let hi = HEX_DIGITS[(b >> 4) as usize];
        let lo = HEX_DIGITS[(b & 0x0F) as usize];
        let _ = out.push(hi as char);
        let _ = out.push(lo as char);
    }
    out
}

const HEX_DIGITS: [u8; 16] = *b"0123456789ABCDEF";
