//! Transport channel between the two peers
//!
//! The session treats the transport as a reliable, ordered message pipe.
//! The concrete implementation frames serde-tagged JSON messages one per
//! line over TCP; an in-process loopback pair backs the tests. Reader and
//! writer run as tokio tasks and talk to the session tick loop only
//! through mpsc queues, so the session never blocks on the network.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::net::protocol::PeerMsg;

/// Queue depth between the socket tasks and the session tick loop
const CHANNEL_CAPACITY: usize = 64;

/// Events surfaced to the session when it drains the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A parsed message from the remote peer
    Message(PeerMsg),
    /// The transport is gone; reported exactly once
    Closed,
}

/// Connection establishment errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to accept a peer connection: {0}")]
    Accept(std::io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// One end of the peer-to-peer message pipe
///
/// Sends are fire-and-forget and receives are polled, never awaited, so
/// the owning session stays tick-driven. Dropping the channel releases the
/// underlying socket: the writer task sees its queue close and exits,
/// which closes the stream and surfaces EOF to the remote peer.
pub struct PeerChannel {
    outbound: mpsc::Sender<ChannelEvent>,
    inbound: mpsc::Receiver<ChannelEvent>,
    open: Arc<AtomicBool>,
    closed_seen: bool,
}

impl PeerChannel {
    /// Host a session: bind, then wait for exactly one peer to connect.
    /// The hosting side is the Primary peer for the session.
    pub async fn host(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        info!(addr = %addr, "Hosting, waiting for a peer");
        Self::accept_on(listener).await
    }

    /// Accept one peer on an already-bound listener
    pub async fn accept_on(listener: TcpListener) -> Result<Self, TransportError> {
        let (stream, peer_addr) = listener.accept().await.map_err(TransportError::Accept)?;
        info!(peer = %peer_addr, "Peer connected");
        Ok(Self::from_stream(stream))
    }

    /// Join a hosted session. The joining side is the Secondary peer.
    pub async fn join(addr: SocketAddr) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect { addr, source })?;
        info!(host = %addr, "Connected to host");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an established stream in reader/writer tasks
    fn from_stream(stream: TcpStream) -> Self {
        let (mut read_half, mut write_half) = stream.into_split();
        let (out_tx, mut out_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);
        let open = Arc::new(AtomicBool::new(true));

        // Writer task: session queue -> socket
        let writer_open = open.clone();
        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let ChannelEvent::Message(msg) = event else {
                    continue;
                };
                let mut json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode outbound message");
                        continue;
                    }
                };
                json.push('\n');
                if let Err(e) = write_half.write_all(json.as_bytes()).await {
                    debug!(error = %e, "Peer write failed");
                    break;
                }
            }
            writer_open.store(false, Ordering::Relaxed);
        });

        // Reader task: socket -> session queue. Unparseable frames are a
        // protocol violation by the remote peer and are skipped, not fatal.
        let reader_open = open.clone();
        tokio::spawn(async move {
            let mut buf = BytesMut::with_capacity(4096);
            'io: loop {
                match read_half.read_buf(&mut buf).await {
                    Ok(0) => break, // EOF: peer went away
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "Peer read failed");
                        break;
                    }
                }

                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let frame = buf.split_to(pos + 1);
                    let line = &frame[..frame.len() - 1];
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_slice::<PeerMsg>(line) {
                        Ok(msg) => {
                            if in_tx.send(ChannelEvent::Message(msg)).await.is_err() {
                                // Session side is gone, stop reading
                                break 'io;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Dropping unparseable peer message");
                        }
                    }
                }
            }
            reader_open.store(false, Ordering::Relaxed);
            // Dropping in_tx surfaces Closed to the session exactly once
        });

        Self {
            outbound: out_tx,
            inbound: in_rx,
            open,
            closed_seen: false,
        }
    }

    /// In-process loopback pair. Messages sent on one end arrive on the
    /// other in order; dropping one end surfaces Closed on its peer.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);
        let (b_tx, a_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);
        let a = Self {
            outbound: a_tx,
            inbound: a_rx,
            open: Arc::new(AtomicBool::new(true)),
            closed_seen: false,
        };
        let b = Self {
            outbound: b_tx,
            inbound: b_rx,
            open: Arc::new(AtomicBool::new(true)),
            closed_seen: false,
        };
        (a, b)
    }

    /// Fire-and-forget send. A closed or congested channel drops the
    /// message; reliability above this point comes from the transport,
    /// not from retries.
    pub fn send(&self, msg: PeerMsg) {
        if !self.is_open() {
            return;
        }
        if let Err(e) = self.outbound.try_send(ChannelEvent::Message(msg)) {
            debug!(error = %e, "Outbound queue rejected message");
        }
    }

    /// Drain one pending event, if any. `Closed` is reported exactly once;
    /// afterwards the channel only ever returns `None`.
    pub fn poll(&mut self) -> Option<ChannelEvent> {
        if self.closed_seen {
            return None;
        }
        match self.inbound.try_recv() {
            Ok(ChannelEvent::Closed) | Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed_seen = true;
                self.open.store(false, Ordering::Relaxed);
                Some(ChannelEvent::Closed)
            }
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
        }
    }

    /// Whether the transport is still believed to be up
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed) && !self.closed_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::Facing;

    #[tokio::test]
    async fn loopback_pair_delivers_in_order() {
        let (a, mut b) = PeerChannel::pair();

        a.send(PeerMsg::ReadyStatus { is_ready: true });
        a.send(PeerMsg::Move {
            x: 1.0,
            y: 2.0,
            vx: 0.0,
            vy: 0.0,
            facing_direction: Facing::Idle,
        });

        assert_eq!(
            b.poll(),
            Some(ChannelEvent::Message(PeerMsg::ReadyStatus { is_ready: true }))
        );
        assert!(matches!(
            b.poll(),
            Some(ChannelEvent::Message(PeerMsg::Move { .. }))
        ));
        assert_eq!(b.poll(), None);
    }

    #[tokio::test]
    async fn dropping_one_end_reports_closed_once() {
        let (a, mut b) = PeerChannel::pair();
        drop(a);

        assert_eq!(b.poll(), Some(ChannelEvent::Closed));
        assert_eq!(b.poll(), None);
        assert!(!b.is_open());
    }

    #[tokio::test]
    async fn tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let host_task = tokio::spawn(PeerChannel::accept_on(listener));
        let joiner = PeerChannel::join(addr).await.unwrap();
        let mut host = host_task.await.unwrap().unwrap();

        joiner.send(PeerMsg::Dead);

        // Poll until the socket tasks have ferried the message across
        let mut received = None;
        for _ in 0..100 {
            if let Some(event) = host.poll() {
                received = Some(event);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(received, Some(ChannelEvent::Message(PeerMsg::Dead)));

        // Tearing down the joiner closes the host's channel
        drop(joiner);
        let mut closed = false;
        for _ in 0..100 {
            match host.poll() {
                Some(ChannelEvent::Closed) => {
                    closed = true;
                    break;
                }
                Some(_) => {}
                None => tokio::time::sleep(std::time::Duration::from_millis(5)).await,
            }
        }
        assert!(closed);
    }
}
