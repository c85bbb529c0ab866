//! In-memory connection and listener.
//!
//! Every clone of a [`MemoryConnection`] shares one pipe, so a test can
//! hand a clone to the listener, let the control loop consume and close
//! it, then inspect what was written.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::transport::{Connection, Listener};

/// Errors raised by [`MemoryConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The local side already closed the connection.
    Closed,
    /// Write failure injected by the test.
    WriteFailed,
}

#[derive(Debug, Default)]
struct Pipe {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    peer_closed: bool,
    closed: bool,
    fail_writes: bool,
    stall_writes: bool,
}

/// One end of an in-process byte pipe.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    pipe: Rc<RefCell<Pipe>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection whose peer has already sent `bytes` and keeps the socket open.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let conn = Self::new();
        conn.push_input(bytes);
        conn
    }

    /// Connection carrying a complete `GET` request with one header.
    pub fn get(target: &str) -> Self {
        Self::from_bytes(format!("GET {target} HTTP/1.1\r\nHost: 10.0.0.2\r\n\r\n").as_bytes())
    }

    /// Queue bytes as if the peer sent them.
    pub fn push_input(&self, bytes: &[u8]) {
        self.pipe.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    /// Simulate the peer closing its side.
    pub fn hang_up(&self) {
        self.pipe.borrow_mut().peer_closed = true;
    }

    /// Make every subsequent write return an error.
    pub fn fail_writes(&self) {
        self.pipe.borrow_mut().fail_writes = true;
    }

    /// Make every subsequent write accept zero bytes.
    pub fn stall_writes(&self) {
        self.pipe.borrow_mut().stall_writes = true;
    }

    /// Everything written to the connection so far.
    pub fn written(&self) -> Vec<u8> {
        self.pipe.borrow().outbound.clone()
    }

    /// [`written`](Self::written) as text, lossily decoded.
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.pipe.borrow().outbound).into_owned()
    }

    /// True once the local side has called [`Connection::close`].
    pub fn is_closed(&self) -> bool {
        self.pipe.borrow().closed
    }
}

impl Connection for MemoryConnection {
    type Error = MemoryError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MemoryError> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.closed {
            return Err(MemoryError::Closed);
        }
        let n = buf.len().min(pipe.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, MemoryError> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.closed {
            return Err(MemoryError::Closed);
        }
        if pipe.fail_writes {
            return Err(MemoryError::WriteFailed);
        }
        if pipe.stall_writes {
            return Ok(0);
        }
        pipe.outbound.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), MemoryError> {
        if self.pipe.borrow().closed {
            return Err(MemoryError::Closed);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let pipe = self.pipe.borrow();
        !pipe.closed && !(pipe.peer_closed && pipe.inbound.is_empty())
    }

    fn close(&mut self) {
        self.pipe.borrow_mut().closed = true;
    }
}

/// Listener backed by a queue of pre-built connections.
#[derive(Debug, Default)]
pub struct MemoryListener {
    pending: VecDeque<MemoryConnection>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connection; returns a handle sharing its pipe.
    pub fn push(&mut self, conn: MemoryConnection) -> MemoryConnection {
        let handle = conn.clone();
        self.pending.push_back(conn);
        handle
    }

    /// Number of connections not yet accepted.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Listener for MemoryListener {
    type Conn = MemoryConnection;

    fn poll_accept(&mut self) -> Option<MemoryConnection> {
        self.pending.pop_front()
    }
}
