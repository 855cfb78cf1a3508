//! Simple TCP-based P2P Network Manager
//!
//! Frames are length-delimited JSON [`NetworkMessage`]s. Every connection
//! opens with a `Hello` exchange so both ends know the stable [`PeerID`] of
//! the other; connections are keyed by that identity.

use crate::error::{Result, TradeError};
use crate::types::{PeerID, Position};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use super::message::NetworkMessage;

/// How long a fresh connection may take to say hello
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

type FrameReader = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
type FrameWriter = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

/// Network events that can occur
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// Handshake completed with a peer
    PeerConnected {
        peer: PeerID,
        name: String,
        position: Position,
    },
    /// Peer disconnected
    PeerDisconnected(PeerID),
    /// Message received from peer
    MessageReceived {
        from: PeerID,
        message: NetworkMessage,
    },
}

/// Peer connection state
struct PeerConnection {
    id: u64,
    writer: Arc<Mutex<FrameWriter>>,
}

/// What we announce in our `Hello`
struct LocalIdentity {
    peer: PeerID,
    name: String,
    position: std::sync::Mutex<Position>,
}

impl LocalIdentity {
    fn hello(&self) -> NetworkMessage {
        let position = *self.position.lock().unwrap_or_else(|e| e.into_inner());
        NetworkMessage::Hello {
            peer: self.peer.clone(),
            name: self.name.clone(),
            position,
        }
    }
}

/// State shared with the accept and read tasks
struct Shared {
    local: LocalIdentity,
    peers: Mutex<HashMap<PeerID, PeerConnection>>,
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    next_conn_id: AtomicU64,
}

/// Simple TCP-based P2P Network Manager
pub struct NetworkManager {
    listen_addr: String,
    shared: Arc<Shared>,
    event_rx: Mutex<mpsc::UnboundedReceiver<NetworkEvent>>,
}

impl NetworkManager {
    /// Bind `127.0.0.1:listen_port` (0 picks a free port) and start accepting
    pub async fn new(
        local_peer_id: PeerID,
        name: &str,
        position: Position,
        listen_port: u16,
    ) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", listen_port))
            .await
            .map_err(|e| TradeError::NetworkConnection(e.to_string()))?;
        let listen_addr = listener
            .local_addr()
            .map_err(|e| TradeError::NetworkConnection(e.to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            local: LocalIdentity {
                peer: local_peer_id,
                name: name.to_string(),
                position: std::sync::Mutex::new(position),
            },
            peers: Mutex::new(HashMap::new()),
            event_tx,
            next_conn_id: AtomicU64::new(1),
        });

        tracing::info!("Listening on {} as {}", listen_addr, shared.local.peer);
        tokio::spawn(Self::listen_loop(listener, shared.clone()));

        Ok(Self {
            listen_addr,
            shared,
            event_rx: Mutex::new(event_rx),
        })
    }

    /// Get local peer ID
    pub fn local_peer_id(&self) -> &PeerID {
        &self.shared.local.peer
    }

    /// Get the bound listen address
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Position announced to peers that connect from now on
    pub fn set_position(&self, position: Position) {
        *self
            .shared
            .local
            .position
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = position;
    }

    /// Dial a peer and complete the hello exchange
    pub async fn connect_to_peer(&self, addr: &str) -> Result<PeerID> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TradeError::NetworkConnection(format!("{}: {}", addr, e)))?;

        Self::establish(stream, self.shared.clone()).await
    }

    /// Broadcast a message to all connected peers
    pub async fn broadcast(&self, message: &NetworkMessage) -> Result<()> {
        let frame = Bytes::from(message.to_bytes()?);
        let writers: Vec<(PeerID, Arc<Mutex<FrameWriter>>)> = self
            .shared
            .peers
            .lock()
            .await
            .iter()
            .map(|(id, conn)| (id.clone(), conn.writer.clone()))
            .collect();

        for (peer_id, writer) in writers {
            if let Err(e) = Self::write_frame(&writer, frame.clone()).await {
                tracing::warn!("Failed to send to {}: {}", peer_id, e);
            }
        }

        Ok(())
    }

    /// Send a message to a specific peer
    pub async fn send_to_peer(&self, peer_id: &PeerID, message: &NetworkMessage) -> Result<()> {
        let writer = self
            .shared
            .peers
            .lock()
            .await
            .get(peer_id)
            .map(|conn| conn.writer.clone())
            .ok_or_else(|| TradeError::PeerNotFound(peer_id.0.clone()))?;

        let frame = Bytes::from(message.to_bytes()?);
        let len = frame.len();
        Self::write_frame(&writer, frame).await?;

        tracing::debug!("Sent {} ({} bytes) to {}", message.kind(), len, peer_id);
        Ok(())
    }

    /// Get list of connected peers
    pub async fn connected_peers(&self) -> Vec<PeerID> {
        self.shared.peers.lock().await.keys().cloned().collect()
    }

    /// Wait for the next network event
    pub async fn next_event(&self) -> Option<NetworkEvent> {
        self.event_rx.lock().await.recv().await
    }

    /// Poll for network events (non-blocking)
    pub async fn poll_events(&self) -> Option<NetworkEvent> {
        self.event_rx.lock().await.try_recv().ok()
    }

    async fn write_frame(writer: &Mutex<FrameWriter>, frame: Bytes) -> Result<()> {
        writer
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| TradeError::MessageRouting(e.to_string()))
    }

    /// Listen loop for incoming connections
    async fn listen_loop(listener: TcpListener, shared: Arc<Shared>) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::debug!("New connection from {}", addr);
                    let shared = shared.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::establish(stream, shared).await {
                            tracing::warn!("Handshake with {} failed: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    /// Exchange hellos, register the connection, and start its read loop
    async fn establish(stream: TcpStream, shared: Arc<Shared>) -> Result<PeerID> {
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LengthDelimitedCodec::new());
        let mut writer = FramedWrite::new(write_half, LengthDelimitedCodec::new());

        let hello = Bytes::from(shared.local.hello().to_bytes()?);
        writer
            .send(hello)
            .await
            .map_err(|e| TradeError::Handshake(e.to_string()))?;

        let frame = tokio::time::timeout(HANDSHAKE_TIMEOUT, reader.next())
            .await
            .map_err(|_| TradeError::Handshake("timed out waiting for hello".to_string()))?
            .ok_or_else(|| TradeError::Handshake("connection closed before hello".to_string()))?
            .map_err(|e| TradeError::NetworkConnection(e.to_string()))?;

        let (peer, name, position) = match NetworkMessage::from_bytes(&frame)? {
            NetworkMessage::Hello {
                peer,
                name,
                position,
            } => (peer, name, position),
            other => {
                return Err(TradeError::Handshake(format!(
                    "expected hello, got {}",
                    other.kind()
                )))
            }
        };

        if peer == shared.local.peer {
            return Err(TradeError::Handshake("connected to self".to_string()));
        }

        let conn_id = shared.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let previous = shared.peers.lock().await.insert(
            peer.clone(),
            PeerConnection {
                id: conn_id,
                writer: Arc::new(Mutex::new(writer)),
            },
        );
        if previous.is_some() {
            tracing::debug!("Replacing existing connection to {}", peer);
        }

        tracing::info!("Connected to {} ('{}')", peer, name);
        let _ = shared.event_tx.send(NetworkEvent::PeerConnected {
            peer: peer.clone(),
            name,
            position,
        });

        let peer_id = peer.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::read_loop(&peer_id, reader, &shared).await {
                tracing::debug!("Read loop ended for {}: {}", peer_id, e);
            }

            // Only forget the connection if it was not replaced meanwhile
            let mut peers = shared.peers.lock().await;
            if peers.get(&peer_id).map(|c| c.id) == Some(conn_id) {
                peers.remove(&peer_id);
                drop(peers);
                let _ = shared
                    .event_tx
                    .send(NetworkEvent::PeerDisconnected(peer_id.clone()));
            }
        });

        Ok(peer)
    }

    /// Read loop for a peer connection
    async fn read_loop(peer_id: &PeerID, mut reader: FrameReader, shared: &Shared) -> Result<()> {
        while let Some(frame) = reader.next().await {
            let frame = frame.map_err(|e| TradeError::NetworkConnection(e.to_string()))?;
            tracing::debug!("Received {} bytes from {}", frame.len(), peer_id);

            match NetworkMessage::from_bytes(&frame) {
                Ok(NetworkMessage::Hello { .. }) => {
                    tracing::debug!("Ignoring repeated hello from {}", peer_id);
                }
                Ok(message) => {
                    let _ = shared.event_tx.send(NetworkEvent::MessageReceived {
                        from: peer_id.clone(),
                        message,
                    });
                }
                Err(e) => {
                    tracing::warn!("Malformed frame from {}: {}", peer_id, e);
                }
            }
        }
        Ok(())
    }
}
