//! Connection abstraction: one accepted, byte-oriented client stream.
//!
//! Concrete implementations:
//! - TCP socket over the access point ([`crate::adapters::tcp`])
//! - In-memory pipe for tests ([`crate::net::memory`])
//!
//! The codec and control loop are generic over `Connection`, so a new
//! network stack requires zero changes to the request handling.

/// Byte-oriented client connection.
pub trait Connection {
    /// Error type for this connection.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available right now (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the connection.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// False once the peer has closed its side and no buffered bytes remain.
    fn is_connected(&self) -> bool;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

/// Source of inbound connections.
pub trait Listener {
    type Conn: Connection;

    /// Return one pending connection, if any. Never blocks.
    fn poll_accept(&mut self) -> Option<Self::Conn>;
}

/// A listener that never yields a connection.
/// Useful when the access point is not up yet.
pub struct NullListener;

/// Connection type of [`NullListener`]; never constructed.
pub enum NoConnection {}

impl Connection for NoConnection {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        match *self {}
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize, ()> {
        match *self {}
    }

    fn flush(&mut self) -> Result<(), ()> {
        match *self {}
    }

    fn is_connected(&self) -> bool {
        match *self {}
    }

    fn close(&mut self) {
        match *self {}
    }
}

impl Listener for NullListener {
    type Conn = NoConnection;

    fn poll_accept(&mut self) -> Option<NoConnection> {
        None
    }
}
