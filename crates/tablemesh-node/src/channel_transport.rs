//! Shares one physical transport between the gossip and consensus engines.
//!
//! `GossipMessage` and `ConsensusMessage` each tag their own wire variants
//! with a small `u8`, so the two tag spaces collide if sent over the same
//! transport untagged. `ChannelTransport` prepends a channel discriminant
//! byte on every outbound frame; the node's receive loop strips it back off
//! to decide which engine a frame belongs to, in the spirit of the
//! teacher's numbered-channel convention (`PENDING_CHANNEL`,
//! `RECOVERED_CHANNEL`, ... in its node binary).

use std::net::SocketAddr;
use std::sync::Arc;
use tablemesh_transport::{Transport, TransportError};
use tracing::trace;

pub const GOSSIP_CHANNEL: u8 = 0;
pub const CONSENSUS_CHANNEL: u8 = 1;

/// Wraps a `Transport` so every frame it sends carries `channel` as its
/// first byte. `recv` strips and checks the byte defensively, but in this
/// node's wiring only the central receive loop ever calls `recv` on the
/// shared raw transport directly — per-channel wrappers are used for
/// `send` alone.
pub struct ChannelTransport<T: Transport> {
    inner: Arc<T>,
    channel: u8,
}

impl<T: Transport> ChannelTransport<T> {
    pub fn new(inner: Arc<T>, channel: u8) -> Self {
        Self { inner, channel }
    }
}

impl<T: Transport> Transport for ChannelTransport<T> {
    async fn send(&self, to: SocketAddr, frame: Vec<u8>) -> Result<(), TransportError> {
        let mut tagged = Vec::with_capacity(frame.len() + 1);
        tagged.push(self.channel);
        tagged.extend_from_slice(&frame);
        self.inner.send(to, tagged).await
    }

    async fn recv(&self) -> Result<(SocketAddr, Vec<u8>), TransportError> {
        loop {
            let (from, frame) = self.inner.recv().await?;
            match frame.split_first() {
                Some((&channel, rest)) if channel == self.channel => {
                    return Ok((from, rest.to_vec()))
                }
                Some((&channel, _)) => {
                    trace!(%from, channel, expected = self.channel, "dropped frame for another channel");
                }
                None => trace!(%from, "dropped empty frame"),
            }
        }
    }
}

/// Splits a raw inbound frame into its channel tag and payload, for the
/// node's central receive loop (`node.rs`), which demuxes by hand instead
/// of going through a `ChannelTransport::recv` per engine.
pub fn demux(frame: &[u8]) -> Option<(u8, &[u8])> {
    frame.split_first().map(|(&channel, rest)| (channel, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct RecordingTransport {
        sent: Mutex<VecDeque<(SocketAddr, Vec<u8>)>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(VecDeque::new()),
            }
        }
    }

    impl Transport for RecordingTransport {
        async fn send(&self, to: SocketAddr, frame: Vec<u8>) -> Result<(), TransportError> {
            self.sent.lock().push_back((to, frame));
            Ok(())
        }

        async fn recv(&self) -> Result<(SocketAddr, Vec<u8>), TransportError> {
            unimplemented!("not exercised by this test")
        }
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    #[tokio::test]
    async fn send_prepends_the_channel_byte() {
        let inner = Arc::new(RecordingTransport::new());
        let wrapped = ChannelTransport::new(inner.clone(), GOSSIP_CHANNEL);
        wrapped.send(addr(), vec![9, 9, 9]).await.unwrap();
        let (_, frame) = inner.sent.lock().pop_front().unwrap();
        assert_eq!(frame, vec![GOSSIP_CHANNEL, 9, 9, 9]);
    }

    #[test]
    fn demux_splits_channel_and_payload() {
        let (channel, rest) = demux(&[CONSENSUS_CHANNEL, 1, 2, 3]).unwrap();
        assert_eq!(channel, CONSENSUS_CHANNEL);
        assert_eq!(rest, &[1, 2, 3]);
    }

    #[test]
    fn demux_rejects_an_empty_frame() {
        assert!(demux(&[]).is_none());
    }
}
