//! Client-side mirror of the server's maze and player positions

use log::debug;
use shared::{Cell, Coord, PlayerId, ServerMessage};
use std::collections::HashMap;

/// Everything the client has learned from the server so far.
///
/// The server is authoritative; this only replays what it announced.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    pub my_id: Option<PlayerId>,
    pub maze: Vec<Vec<Cell>>,
    pub players: HashMap<PlayerId, Coord>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one server message. Returns true when the visible picture
    /// changed and is worth redrawing.
    pub fn apply(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::Welcome(id) => {
                self.my_id = Some(id);
                self.maze.clear();
                self.players.clear();
                false
            }
            ServerMessage::Spawn(pos) => {
                if let Some(id) = self.my_id {
                    self.players.insert(id, pos);
                }
                false
            }
            ServerMessage::MazeRow(row) => {
                self.maze.push(row);
                false
            }
            ServerMessage::Pos(id, pos) => {
                let previous = self.players.insert(id, pos);
                previous != Some(pos) || Some(id) == self.my_id
            }
            ServerMessage::Tile(update) => {
                let (x, y) = (update.coord.x, update.coord.y);
                if x < 0 || y < 0 {
                    return false;
                }
                match self
                    .maze
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    Some(cell) => {
                        *cell = update.cell;
                        true
                    }
                    None => {
                        debug!("Tile update outside known maze: ({}, {})", x, y);
                        false
                    }
                }
            }
        }
    }

    pub fn my_position(&self) -> Option<Coord> {
        self.my_id.and_then(|id| self.players.get(&id).copied())
    }

    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        self.maze
            .get(coord.y as usize)
            .and_then(|row| row.get(coord.x as usize))
            .copied()
    }

    /// True once our own player stands on the exit.
    pub fn has_won(&self) -> bool {
        self.my_position()
            .and_then(|pos| self.cell(pos))
            .is_some_and(|cell| cell == Cell::Exit)
    }
}
