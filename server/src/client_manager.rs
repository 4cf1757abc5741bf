//! Registry of live player connections
//!
//! This module tracks which socket belongs to which player and fans
//! messages out to them:
//! - Connection lifecycle (register on join, remove on disconnect)
//! - Point-to-point delivery for the join greeting
//! - Broadcast with dead peer detection
//!
//! Each connection is represented by the sending half of a bounded
//! channel whose receiver is drained by that connection's writer task. A
//! send fails once the writer has exited or once the queue is full, which
//! is how broken and stalled sockets are noticed.

use log::{debug, info, warn};
use shared::{PlayerId, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Lines a connection may have queued beyond its join greeting before it
/// counts as unreachable.
pub const OUTBOX_CAPACITY: usize = 1024;

/// Send handle for one connection; every item is one protocol line.
pub type Outbox = mpsc::Sender<String>;

/// A joined connection and where to deliver its messages
#[derive(Debug)]
pub struct Client {
    /// Player this connection controls
    pub id: PlayerId,
    /// Peer address, kept for logging
    pub addr: SocketAddr,
    /// When the player joined
    pub joined_at: Instant,
    outbox: Outbox,
}

impl Client {
    pub fn new(id: PlayerId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            joined_at: Instant::now(),
            outbox,
        }
    }

    /// Queues every message in order. Returns false as soon as the
    /// connection's writer is gone or its queue is full.
    pub fn send_all(&self, messages: &[ServerMessage]) -> bool {
        messages
            .iter()
            .all(|message| match self.outbox.try_send(message.to_string()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    debug!("Outbox of client {} is full", self.id);
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            })
    }
}

/// Maps player ids to their connections.
///
/// Not synchronised on its own: it lives inside the session lock next to
/// the game state so both always agree on who is connected.
#[derive(Debug, Default)]
pub struct ClientManager {
    clients: HashMap<PlayerId, Client>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, replacing any previous one for the same id.
    pub fn add_client(&mut self, id: PlayerId, addr: SocketAddr, outbox: Outbox) {
        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr, outbox));
    }

    /// Returns true if the client was found and removed.
    pub fn remove_client(&mut self, id: &PlayerId) -> bool {
        if let Some(client) = self.clients.remove(id) {
            info!(
                "Client {} ({}) disconnected after {:.1}s",
                client.id,
                client.addr,
                client.joined_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.clients.contains_key(id)
    }

    /// Sends to a single client. Unknown ids count as failures.
    pub fn send_to(&self, id: &PlayerId, messages: &[ServerMessage]) -> bool {
        self.clients
            .get(id)
            .is_some_and(|client| client.send_all(messages))
    }

    /// Sends the batch to every client in id order and returns the ids whose
    /// connection is gone. Callers decide what to do with the failures.
    pub fn broadcast(&self, messages: &[ServerMessage]) -> Vec<PlayerId> {
        let mut failed = Vec::new();
        for id in self.ids() {
            if let Some(client) = self.clients.get(&id) {
                if !client.send_all(messages) {
                    warn!("Failed to deliver to client {} at {}", id, client.addr);
                    failed.push(id);
                }
            }
        }
        failed
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn addr_of(&self, id: &PlayerId) -> Option<SocketAddr> {
        self.clients.get(id).map(|client| client.addr)
    }

    /// Returns the number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
