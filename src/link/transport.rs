//! Transport abstraction — any byte-oriented channel to the radio modem.
//!
//! Concrete implementations:
//! - UART serial to the modem on real hardware
//! - scripted in-memory channels in tests
//!
//! The modem driver and gateway service are generic over `Transport`, so
//! swapping the serial backend requires zero changes to the link logic.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null transport that discards all writes and never reads.
/// Useful as a placeholder before the serial port is opened.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn available(&self) -> bool {
        false
    }
}
