//! Hardware address type.
//!
//! The 6-byte MAC is the only identifier a node has before pairing assigns
//! it a node ID. The printable form is uppercase colon-hex
//! (`AA:BB:CC:11:22:33`) and must round-trip exactly in both directions.

use core::fmt;

use super::MAC_ADDR_LEN;

/// A node's 6-byte hardware address. Equality is bytewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; MAC_ADDR_LEN]);

impl MacAddr {
    /// The all-zero address, used as a cleared-session placeholder.
    pub const ZERO: Self = Self([0; MAC_ADDR_LEN]);

    pub fn as_bytes(&self) -> &[u8; MAC_ADDR_LEN] {
        &self.0
    }

    /// Parse the colon-hex printable form. Accepts upper or lower case hex;
    /// rejects anything that is not exactly six two-digit groups.
    pub fn parse(s: &str) -> Option<Self> {
        let mut bytes = [0u8; MAC_ADDR_LEN];
        let mut parts = s.trim().split(':');
        for byte in &mut bytes {
            let part = parts.next()?;
            if part.len() != 2 {
                return None;
            }
            *byte = u8::from_str_radix(part, 16).ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

impl From<[u8; MAC_ADDR_LEN]> for MacAddr {
    fn from(bytes: [u8; MAC_ADDR_LEN]) -> Self {
        Self(bytes)
    }
}
