//! Unified error types for the gateway core.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level update loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply passed through the packet
//! dispatcher and state machines without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level gateway error
// ---------------------------------------------------------------------------

/// Every fallible operation in the gateway core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The radio link / modem driver failed.
    Link(LinkError),
    /// A registry operation was rejected.
    Registry(RegistryError),
    /// A pairing request was rejected.
    Pairing(PairingError),
    /// Persistent node storage failed.
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Pairing(e) => write!(f, "pairing: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Radio link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The modem did not acknowledge a command within its deadline.
    TxTimeout,
    /// The modem answered `ERROR` to a transmit command.
    TxRejected,
    /// The transport returned a read or write error.
    Io,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TxTimeout => write!(f, "transmit not acknowledged in time"),
            Self::TxRejected => write!(f, "modem rejected transmit"),
            Self::Io => write!(f, "transport I/O error"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The registered-node table is at capacity.
    CapacityFull,
    /// A node with this ID is already registered.
    DuplicateId,
    /// A node with this MAC is already registered.
    DuplicateMac,
    /// No node with the requested ID is registered.
    UnknownNode,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityFull => write!(f, "node table full"),
            Self::DuplicateId => write!(f, "node ID already registered"),
            Self::DuplicateMac => write!(f, "MAC already registered"),
            Self::UnknownNode => write!(f, "node not registered"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Pairing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingError {
    /// A pairing session is already in flight.
    Busy,
    /// The target MAC is already a registered node.
    AlreadyRegistered,
    /// All node IDs 1..=254 are taken.
    NoFreeId,
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "pairing already in progress"),
            Self::AlreadyRegistered => write!(f, "node already registered"),
            Self::NoFreeId => write!(f, "no free node IDs"),
        }
    }
}

impl From<PairingError> for Error {
    fn from(e: PairingError) -> Self {
        Self::Pairing(e)
    }
}

// ---------------------------------------------------------------------------
// Persistent store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No saved registry exists (first boot).
    NotFound,
    /// The stored document failed to parse.
    Corrupted,
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no saved nodes"),
            Self::Corrupted => write!(f, "saved nodes corrupted"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Gateway-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
