//! Non-blocking UDP control-message receiver

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::MessageSource;
use crate::encoder::ControlMessage;

/// Largest payload read per receive
pub const MAX_PAYLOAD_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket setup failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Single datagram socket, bound once at construction
pub struct SocketIngest {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl SocketIngest {
    /// Bind to `ip:port` and switch to non-blocking mode
    pub fn bind(ip_address: &str, port: u16) -> Result<Self, IngestError> {
        let addr = format!("{}:{}", ip_address, port);
        let socket = UdpSocket::bind(&addr).map_err(|source| IngestError::Bind {
            addr: addr.clone(),
            source,
        })?;
        socket.set_nonblocking(true)?;

        info!("Ingest socket bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            buffer: vec![0u8; MAX_PAYLOAD_SIZE],
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl MessageSource for SocketIngest {
    fn try_receive(&mut self) -> Option<ControlMessage> {
        let len = match self.socket.recv(&mut self.buffer) {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return None,
            Err(e) => {
                warn!("UDP recv error: {}", e);
                return None;
            }
        };

        decode_payload(&self.buffer[..len])
    }
}

/// Turn a datagram into a message.
///
/// Non-UTF-8 payloads are dropped with a warning, surrounding whitespace is
/// trimmed, and empty payloads are ignored.
pub fn decode_payload(payload: &[u8]) -> Option<ControlMessage> {
    let text = match std::str::from_utf8(payload) {
        Ok(text) => text,
        Err(e) => {
            warn!("Dropping {} byte datagram, not valid UTF-8: {}", payload.len(), e);
            return None;
        }
    };

    let text = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if text.is_empty() {
        debug!("Ignoring empty datagram");
        return None;
    }

    Some(ControlMessage::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(b"1011"), Some(ControlMessage::new("1011")));
        assert_eq!(decode_payload(b"1011\n"), Some(ControlMessage::new("1011")));
        assert_eq!(decode_payload(b" 10 11\r\n"), Some(ControlMessage::new("10 11")));
    }

    #[test]
    fn test_decode_payload_rejects() {
        assert_eq!(decode_payload(b""), None);
        assert_eq!(decode_payload(b"\n"), None);
        assert_eq!(decode_payload(&[0x31, 0xFF, 0x30]), None);
    }

    #[test]
    fn test_no_data_is_none() {
        let mut ingest = SocketIngest::bind("127.0.0.1", 0).unwrap();
        assert!(ingest.try_receive().is_none());
        assert!(ingest.try_receive().is_none());
    }

    #[test]
    fn test_bind_conflict_is_error() {
        let first = SocketIngest::bind("127.0.0.1", 0).unwrap();
        let port = first.local_addr().unwrap().port();
        let second = SocketIngest::bind("127.0.0.1", port);
        assert!(matches!(second, Err(IngestError::Bind { .. })));
    }

    #[test]
    fn test_loopback_receive() {
        let mut ingest = SocketIngest::bind("127.0.0.1", 0).unwrap();
        let target = ingest.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"10001101", target).unwrap();

        let mut received = None;
        for _ in 0..100 {
            received = ingest.try_receive();
            if received.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(received, Some(ControlMessage::new("10001101")));
        assert!(ingest.try_receive().is_none());
    }

    // Windows reports an error for truncated datagrams instead
    #[cfg(unix)]
    #[test]
    fn test_oversized_datagram_truncated() {
        let mut ingest = SocketIngest::bind("127.0.0.1", 0).unwrap();
        let target = ingest.local_addr().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let payload = "1".repeat(MAX_PAYLOAD_SIZE + 100);
        sender.send_to(payload.as_bytes(), target).unwrap();

        let mut received = None;
        for _ in 0..100 {
            received = ingest.try_receive();
            if received.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(received.map(|m| m.len()), Some(MAX_PAYLOAD_SIZE));
    }
}
