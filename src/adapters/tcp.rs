//! TCP adapter over `std::net`.
//!
//! The listening socket is non-blocking so [`Listener::poll_accept`] never
//! stalls the loop. Accepted streams use a 1 ms read timeout: a read with
//! nothing pending returns `Ok(0)` and the codec's inactivity bound
//! decides when to give up.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, warn};

use crate::net::{Connection, Listener};

const READ_POLL: Duration = Duration::from_millis(1);
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// One accepted client socket.
pub struct TcpConnection {
    stream: TcpStream,
    peer_closed: bool,
    closed: bool,
}

impl TcpConnection {
    fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(READ_POLL))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            peer_closed: false,
            closed: false,
        })
    }
}

impl Connection for TcpConnection {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.peer_closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }

    fn is_connected(&self) -> bool {
        !self.closed && !self.peer_closed
    }

    fn close(&mut self) {
        if !self.closed {
            // The peer may already be gone; nothing to do about it here.
            let _ = self.stream.shutdown(Shutdown::Both);
            self.closed = true;
        }
    }
}

/// Non-blocking listening socket.
pub struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Listener for TcpAcceptor {
    type Conn = TcpConnection;

    fn poll_accept(&mut self) -> Option<TcpConnection> {
        match self.listener.accept() {
            Ok((stream, peer)) => match TcpConnection::from_stream(stream) {
                Ok(conn) => {
                    debug!("HTTP | client {peer}");
                    Some(conn)
                }
                Err(e) => {
                    warn!("could not configure socket from {peer}: {e}");
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("accept failed: {e}");
                None
            }
        }
    }
}
