//! The transport adapter: an opaque, best-effort message carrier wrapped in
//! per-peer authenticated encryption (§4.9, C10).
//!
//! The contract treats the network as hostile to ordering: messages may be
//! dropped, reordered, or duplicated, and every higher invariant (gossip
//! dedup, log sequencing, consensus timeouts) is built assuming exactly
//! that. Grounded on the teacher's `node` crate split between a concrete
//! runtime adapter and an in-memory harness used by its own tests
//! (`examples/happybigmtn-nullspace/node/src/application/actor.rs`).

mod error;

pub use error::TransportError;

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tablemesh_crypto::{open, seal, SessionKey};
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Datagrams above this size are rejected before sending (§4.9 "opaque byte
/// message"; conservative UDP-safe bound well under common path MTUs).
pub const MAX_FRAME_LEN: usize = 60_000;

/// Sends and receives opaque byte frames to/from peer addresses. Messages
/// may be dropped, reordered, or duplicated by the implementation; callers
/// must not assume otherwise (§4.9).
pub trait Transport: Send + Sync {
    async fn send(&self, to: SocketAddr, frame: Vec<u8>) -> Result<(), TransportError>;
    async fn recv(&self) -> Result<(SocketAddr, Vec<u8>), TransportError>;
}

/// Production transport: best-effort framing over UDP datagrams, chosen
/// because datagram delivery already has the drop/reorder/duplicate
/// semantics the protocol is specified against, rather than papering over
/// a reliable stream with artificial loss.
pub struct TokioUdpTransport {
    socket: UdpSocket,
    sessions: Mutex<HashMap<SocketAddr, Arc<SessionKey>>>,
}

impl TokioUdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Registers the session key established with `peer` at handshake time
    /// (§4.9 "wrapped with authenticated encryption keyed by the session
    /// established at peer-handshake time"). Handshake itself is out of
    /// scope; callers derive the key out of band and install it here.
    pub fn register_session(&self, peer: SocketAddr, key: SessionKey) {
        self.sessions.lock().insert(peer, Arc::new(key));
    }
}

impl Transport for TokioUdpTransport {
    async fn send(&self, to: SocketAddr, frame: Vec<u8>) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge);
        }
        let key = {
            let sessions = self.sessions.lock();
            sessions.get(&to).cloned()
        };
        let Some(key) = key else {
            return Err(TransportError::UnknownDestination);
        };
        let sealed = seal(&key, &frame);
        self.socket.send_to(&sealed, to).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<(SocketAddr, Vec<u8>), TransportError> {
        let mut buf = vec![0u8; MAX_FRAME_LEN + tablemesh_crypto::NONCE_LEN + 16];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            let key = {
                let sessions = self.sessions.lock();
                sessions.get(&from).cloned()
            };
            let Some(key) = key else {
                debug!(%from, "dropped frame from peer with no established session");
                continue;
            };
            match open(&key, &buf[..len]) {
                Ok(plaintext) => return Ok((from, plaintext)),
                Err(_) => {
                    warn!(%from, "dropped frame that failed authentication");
                    continue;
                }
            }
        }
    }
}

/// Deterministic in-process transport for multi-node test harnesses: no
/// real sockets, no AEAD (session establishment is assumed out of band for
/// tests), direct hand-off through per-address queues.
#[derive(Clone)]
pub struct InMemoryTransport {
    self_addr: SocketAddr,
    inbox: Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>,
    notify: Arc<Notify>,
    network: Arc<Mutex<HashMap<SocketAddr, (Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>, Arc<Notify>)>>>,
}

impl InMemoryTransport {
    /// Creates a transport bound to `self_addr` within `network`, a shared
    /// registry every node in the harness passes the same `Arc` of.
    pub fn new(
        self_addr: SocketAddr,
        network: Arc<Mutex<HashMap<SocketAddr, (Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>, Arc<Notify>)>>>,
    ) -> Self {
        let inbox = Arc::new(Mutex::new(VecDeque::new()));
        let notify = Arc::new(Notify::new());
        network
            .lock()
            .insert(self_addr, (inbox.clone(), notify.clone()));
        Self {
            self_addr,
            inbox,
            notify,
            network,
        }
    }

    pub fn new_network() -> Arc<
        Mutex<HashMap<SocketAddr, (Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>, Arc<Notify>)>>,
    > {
        Arc::new(Mutex::new(HashMap::new()))
    }

    pub fn self_addr(&self) -> SocketAddr {
        self.self_addr
    }
}

impl Transport for InMemoryTransport {
    async fn send(&self, to: SocketAddr, frame: Vec<u8>) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge);
        }
        let target = {
            let network = self.network.lock();
            network.get(&to).cloned()
        };
        let Some((inbox, notify)) = target else {
            return Err(TransportError::UnknownDestination);
        };
        inbox.lock().push_back((self.self_addr, frame));
        notify.notify_one();
        Ok(())
    }

    async fn recv(&self) -> Result<(SocketAddr, Vec<u8>), TransportError> {
        loop {
            if let Some(item) = self.inbox.lock().pop_front() {
                return Ok(item);
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_transport_delivers_sent_frame() {
        let network = InMemoryTransport::new_network();
        let a_addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let b_addr: SocketAddr = "127.0.0.1:2".parse().unwrap();
        let a = InMemoryTransport::new(a_addr, network.clone());
        let b = InMemoryTransport::new(b_addr, network);

        a.send(b_addr, b"hello".to_vec()).await.unwrap();
        let (from, frame) = b.recv().await.unwrap();
        assert_eq!(from, a_addr);
        assert_eq!(frame, b"hello");
    }

    #[tokio::test]
    async fn send_to_unknown_destination_errors() {
        let network = InMemoryTransport::new_network();
        let a_addr: SocketAddr = "127.0.0.1:3".parse().unwrap();
        let unknown: SocketAddr = "127.0.0.1:4".parse().unwrap();
        let a = InMemoryTransport::new(a_addr, network);
        assert!(matches!(
            a.send(unknown, b"ping".to_vec()).await,
            Err(TransportError::UnknownDestination)
        ));
    }

    #[tokio::test]
    async fn udp_transport_drops_frames_with_no_session() {
        let transport = TokioUdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let other = TokioUdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let other_addr = other.local_addr().unwrap();
        // No session registered for `other_addr`: send must fail fast
        // rather than silently emitting an unauthenticated frame.
        assert!(matches!(
            transport.send(other_addr, b"x".to_vec()).await,
            Err(TransportError::UnknownDestination)
        ));
    }
}
