//! Radio link layer: byte transport, line framing, AT modem driver.
//!
//! ```text
//!   Transport ──▶ LineAssembler ──▶ parse_rx_notification ──▶ RadioFrame
//!       ▲                                                        │
//!       └──────────── AtModem (PRECV/PSEND dance) ◀──────────────┘
//! ```

pub mod framing;
pub mod modem;
pub mod transport;

pub use framing::{LineAssembler, RadioFrame, parse_rx_notification};
pub use modem::AtModem;
pub use transport::{NullTransport, Transport};
