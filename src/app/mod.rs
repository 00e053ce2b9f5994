//! Application core: the gateway service and its host-facing boundary.
//!
//! [`service::GatewayService`] owns every stateful subsystem (registry, scan,
//! pairing, modem driver) and is driven by the host's cooperative loop. The
//! host plugs in through the [`ports`] traits and listens on the [`events`]
//! stream; nothing in here touches the filesystem or wall clock directly.

pub mod events;
pub mod ports;
pub mod service;

pub use events::GatewayEvent;
pub use ports::{Clock, EventSink, NodeStorePort, PersistedNode};
pub use service::GatewayService;
