//! Host-side implementations of the [`app::ports`](crate::app::ports) traits.
//!
//! These are the pieces that actually touch the operating system: the wall
//! clock, the filesystem node store, and a logging event sink. Swap any of
//! them for a test double without the core noticing.

pub mod fs_store;
pub mod log_sink;
pub mod time;

pub use fs_store::FileNodeStore;
pub use log_sink::LogSink;
pub use time::SystemClock;
