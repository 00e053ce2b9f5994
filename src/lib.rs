//! LoRa P2P gateway core.
//!
//! Manages a population of remote relay nodes over a RAK-style AT-command
//! LoRa modem: node discovery, pairing and ID assignment, command dispatch,
//! status ingestion and liveness supervision.
//!
//! The crate is organised hexagonally. [`app::GatewayService`] holds all
//! session state and is driven by the host's cooperative loop; it talks to
//! the world only through the [`link::Transport`] byte stream and the port
//! traits in [`app::ports`], and reports upward through the
//! [`app::GatewayEvent`] stream. Ready-made host adapters live in
//! [`adapters`].
//!
//! ```no_run
//! use relaygate::adapters::{FileNodeStore, LogSink, SystemClock};
//! use relaygate::app::GatewayService;
//! use relaygate::config::GatewayConfig;
//! use relaygate::link::NullTransport;
//!
//! let mut gateway = GatewayService::new(
//!     GatewayConfig::default(),
//!     NullTransport, // a real host plugs in its serial port here
//!     SystemClock::new(),
//!     LogSink,
//!     FileNodeStore::new("/var/lib/relaygate/nodes.json"),
//! );
//! gateway.init();
//! loop {
//!     gateway.update();
//! }
//! ```

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod link;
pub mod pairing;
pub mod protocol;
pub mod registry;
pub mod scan;

pub use app::{GatewayEvent, GatewayService};
pub use config::{GatewayConfig, RadioConfig};
pub use error::{Error, Result};
pub use protocol::MacAddr;
