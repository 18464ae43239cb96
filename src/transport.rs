// s7link - Native Rust S7 client (Snap7-style) for Siemens PLCs.
// Copyright 2025 - Davide Nardella

//! Byte-stream transport beneath the ISO layer.
//!
//! The session only needs a blocking stream that can connect, send a whole
//! buffer and receive an exact number of bytes. [`TcpTransport`] is the real
//! implementation; tests plug in scripted transports through the same trait.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::S7Error;

/// ### Blocking byte-stream collaborator
///
/// All calls block, bounded only by the timeouts the implementation enforces.
pub trait MessageTransport {
    /// Opens the stream to `host:port`, giving up after `timeout_ms`.
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u64) -> Result<(), S7Error>;

    /// Sends the whole buffer.
    fn send(&mut self, buffer: &[u8]) -> Result<(), S7Error>;

    /// Fills exactly `buffer[offset..offset + len]`.
    fn receive(&mut self, buffer: &mut [u8], offset: usize, len: usize) -> Result<(), S7Error>;

    /// Closes the stream. Must be safe to call when already closed.
    fn close(&mut self);

    fn is_connected(&self) -> bool;

    /// Send/receive timeouts for the next connection. Transports without
    /// timeouts may ignore them.
    fn set_io_timeouts(&mut self, _send_timeout_ms: u64, _recv_timeout_ms: u64) {}
}

/// TCP implementation of [`MessageTransport`]
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    send_timeout_ms: u64,
    recv_timeout_ms: u64,
}

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport {
            stream: None,
            send_timeout_ms: 2000,
            recv_timeout_ms: 2000,
        }
    }

    fn stream(&mut self) -> Result<&mut TcpStream, S7Error> {
        self.stream.as_mut().ok_or(S7Error::NotConnected)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn connect_error(err: io::Error) -> S7Error {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => S7Error::ConnectionTimeout,
        ErrorKind::AddrNotAvailable => S7Error::UnreachableHost,
        _ => S7Error::ConnectionFailed,
    }
}

fn send_error(err: io::Error) -> S7Error {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => S7Error::SendTimeout,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            S7Error::ConnectionReset
        }
        _ => S7Error::DataSend,
    }
}

fn receive_error(err: io::Error) -> S7Error {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => S7Error::ReceiveTimeout,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::UnexpectedEof => {
            S7Error::ConnectionReset
        }
        _ => S7Error::DataReceive,
    }
}

impl MessageTransport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16, timeout_ms: u64) -> Result<(), S7Error> {
        self.close();

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| S7Error::UnreachableHost)?
            .next()
            .ok_or(S7Error::UnreachableHost)?;

        debug!(%addr, timeout_ms, "opening tcp connection");
        let stream = TcpStream::connect_timeout(&addr, Duration::from_millis(timeout_ms.max(1)))
            .map_err(connect_error)?;

        let setup = |s: &TcpStream| -> io::Result<()> {
            s.set_read_timeout(Some(Duration::from_millis(self.recv_timeout_ms.max(1))))?;
            s.set_write_timeout(Some(Duration::from_millis(self.send_timeout_ms.max(1))))?;
            s.set_nodelay(true)
        };
        setup(&stream).map_err(|_| S7Error::SocketCreation)?;

        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, buffer: &[u8]) -> Result<(), S7Error> {
        trace!(len = buffer.len(), "send");
        self.stream()?.write_all(buffer).map_err(send_error)
    }

    fn receive(&mut self, buffer: &mut [u8], offset: usize, len: usize) -> Result<(), S7Error> {
        let dst = buffer
            .get_mut(offset..offset + len)
            .ok_or(S7Error::InvalidDataSize)?;
        self.stream()?.read_exact(dst).map_err(receive_error)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // A low-level error may have left data in flight, flush both directions
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn set_io_timeouts(&mut self, send_timeout_ms: u64, recv_timeout_ms: u64) {
        self.send_timeout_ms = send_timeout_ms;
        self.recv_timeout_ms = recv_timeout_ms;
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_transport_kinds() {
        let timed_out = || io::Error::from(ErrorKind::TimedOut);
        assert_eq!(connect_error(timed_out()), S7Error::ConnectionTimeout);
        assert_eq!(send_error(timed_out()), S7Error::SendTimeout);
        assert_eq!(receive_error(timed_out()), S7Error::ReceiveTimeout);
        assert_eq!(receive_error(io::Error::from(ErrorKind::UnexpectedEof)), S7Error::ConnectionReset);
        assert_eq!(send_error(io::Error::from(ErrorKind::BrokenPipe)), S7Error::ConnectionReset);
        assert_eq!(connect_error(io::Error::from(ErrorKind::ConnectionRefused)), S7Error::ConnectionFailed);
    }

    #[test]
    fn unconnected_transport_refuses_io() {
        let mut t = TcpTransport::new();
        assert!(!t.is_connected());
        assert_eq!(t.send(&[0u8; 4]), Err(S7Error::NotConnected));
        let mut buf = [0u8; 4];
        assert_eq!(t.receive(&mut buf, 0, 4), Err(S7Error::NotConnected));
        assert_eq!(t.receive(&mut buf, 2, 4), Err(S7Error::InvalidDataSize));
        t.close();
    }

    #[test]
    fn refused_connection_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let mut t = TcpTransport::new();
        let err = t.connect("127.0.0.1", port, 500).unwrap_err();
        assert!(matches!(err, S7Error::ConnectionFailed | S7Error::ConnectionTimeout));
        assert!(!t.is_connected());
    }
}
