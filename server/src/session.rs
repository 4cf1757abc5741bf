//! The single serialization point of the server
//!
//! A [`Session`] pairs the game state with the connection registry. The
//! network layer keeps it behind one mutex, so every join, move and
//! disconnect runs to completion, broadcasts included, before the next one
//! starts. Broadcast order therefore matches the order in which requests
//! acquired the lock.

use crate::client_manager::{ClientManager, Outbox, OUTBOX_CAPACITY};
use crate::game::{GameState, MoveOutcome};
use crate::maze::Maze;
use log::warn;
use shared::{Direction, PlayerId, ServerMessage, TileUpdate};
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug)]
pub struct Session {
    game: GameState,
    clients: ClientManager,
}

impl Session {
    pub fn new(maze: Maze) -> Self {
        Self {
            game: GameState::new(maze),
            clients: ClientManager::new(),
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    /// Creates a player for a new connection.
    ///
    /// The joining client receives `WELCOME`, `SPAWN` and one `MAZEROW` per
    /// row; everyone then gets a fresh `POS` batch.
    pub fn join(&mut self, addr: SocketAddr, outbox: Outbox) -> PlayerId {
        let (id, spawn) = self.game.join();
        self.clients.add_client(id, addr, outbox);

        let mut greeting = vec![ServerMessage::Welcome(id), ServerMessage::Spawn(spawn)];
        greeting.extend(
            self.game
                .maze()
                .grid()
                .iter()
                .map(|row| ServerMessage::MazeRow(row.clone())),
        );
        if !self.clients.send_to(&id, &greeting) {
            self.prune(vec![id]);
        }

        self.broadcast_positions();
        id
    }

    /// Queue size for a new connection: room for the whole join greeting
    /// plus [`OUTBOX_CAPACITY`] lines of backlog.
    pub fn outbox_capacity(&self) -> usize {
        self.game.maze().rows() + 2 + OUTBOX_CAPACITY
    }

    /// Applies a move, then broadcasts its tile changes followed by positions.
    pub fn handle_move(&mut self, id: PlayerId, direction: Direction, now: Instant) -> MoveOutcome {
        let outcome = self.game.move_player(id, direction, now);
        self.broadcast_tiles(&outcome.tiles);
        self.broadcast_positions();
        outcome
    }

    /// Drops the player and its connection and informs the survivors.
    pub fn disconnect(&mut self, id: PlayerId) {
        let removed_player = self.game.remove_player(id);
        let removed_client = self.clients.remove_client(&id);
        if removed_player || removed_client {
            self.broadcast_positions();
        }
    }

    fn broadcast_tiles(&mut self, tiles: &[TileUpdate]) {
        if tiles.is_empty() {
            return;
        }
        let messages: Vec<ServerMessage> = tiles.iter().copied().map(ServerMessage::Tile).collect();
        let failed = self.clients.broadcast(&messages);
        self.prune(failed);
    }

    /// Sends one `POS` line per player to every client. Dead peers found on
    /// the way are pruned and the survivors get a corrected batch.
    fn broadcast_positions(&mut self) {
        loop {
            let messages: Vec<ServerMessage> = self
                .game
                .positions()
                .into_iter()
                .map(|(id, pos)| ServerMessage::Pos(id, pos))
                .collect();

            let failed = self.clients.broadcast(&messages);
            if !self.prune(failed) {
                break;
            }
        }
    }

    /// Removes players whose connection failed. Returns true if any were removed.
    fn prune(&mut self, failed: Vec<PlayerId>) -> bool {
        let mut pruned = false;
        for id in failed {
            warn!("Pruning unreachable player {}", id);
            self.game.remove_player(id);
            pruned |= self.clients.remove_client(&id);
        }
        pruned
    }
}
