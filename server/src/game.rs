//! Authoritative player and door state
//!
//! Doors grant one player at a time a short exclusive lease. The lease is
//! taken on first entry, lasts [`DOOR_LEASE`], and reserves the door plus a
//! handful of nearby path cells which are repainted as highlight. When the
//! lease runs out the door is retired for good and every highlighted cell
//! goes back to plain path.
//!
//! Expiry is checked lazily: each move sweeps stale leases before it is
//! evaluated, so no background timer is required.

use crate::maze::Maze;
use log::{debug, info};
use shared::{Cell, Coord, Direction, PlayerId, TileUpdate, DOOR_LEASE, HIGHLIGHT_LIMIT, START};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub position: Coord,
}

/// Exclusive right of one player to pass a door until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub occupant: PlayerId,
    pub expires_at: Instant,
    /// The door cell followed by the reserved path cells, in BFS order
    pub highlight: Vec<Coord>,
}

/// A live door. `lease` is `None` while the door is idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Door {
    pub lease: Option<Lease>,
}

/// Result of a move request. Rejected moves keep the old position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Coord,
    pub moved: bool,
    pub tiles: Vec<TileUpdate>,
}

#[derive(Debug, Clone)]
pub struct GameState {
    maze: Maze,
    players: HashMap<PlayerId, Player>,
    doors: HashMap<Coord, Door>,
    next_id: u32,
}

impl GameState {
    pub fn new(maze: Maze) -> Self {
        let doors = maze
            .doors()
            .iter()
            .map(|&coord| (coord, Door::default()))
            .collect();

        Self {
            maze,
            players: HashMap::new(),
            doors,
            next_id: 1,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// Creates a player at the start cell.
    pub fn join(&mut self) -> (PlayerId, Coord) {
        let id = PlayerId(self.next_id);
        self.next_id += 1;

        self.players.insert(
            id,
            Player {
                id,
                position: START,
            },
        );
        info!("Added player {} at ({}, {})", id, START.x, START.y);
        (id, START)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.players.remove(&id).is_some() {
            info!("Removed player {}", id);
            true
        } else {
            false
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// All player positions ordered by id.
    pub fn positions(&self) -> Vec<(PlayerId, Coord)> {
        let mut positions: Vec<(PlayerId, Coord)> = self
            .players
            .values()
            .map(|player| (player.id, player.position))
            .collect();
        positions.sort_by_key(|(id, _)| *id);
        positions
    }

    pub fn door(&self, coord: Coord) -> Option<&Door> {
        self.doors.get(&coord)
    }

    /// Coordinates of doors that have not been retired yet, sorted.
    pub fn live_doors(&self) -> Vec<Coord> {
        let mut doors: Vec<Coord> = self.doors.keys().copied().collect();
        doors.sort();
        doors
    }

    /// Attempts a one-cell move.
    ///
    /// Expired leases are swept first and their tile changes are always
    /// reported, even when the mover is unknown. An unknown player gets the
    /// origin back as its position.
    pub fn move_player(&mut self, id: PlayerId, direction: Direction, now: Instant) -> MoveOutcome {
        let mut tiles = self.refresh_doors(now);

        let Some(current) = self.players.get(&id).map(|p| p.position) else {
            debug!("Move from unknown player {}", id);
            return MoveOutcome {
                position: Coord::default(),
                moved: false,
                tiles,
            };
        };

        let target = current.step(direction);
        if !self.can_enter(id, target) {
            debug!(
                "Rejected move of {} from ({}, {}) {}",
                id,
                current.x,
                current.y,
                direction.as_str()
            );
            return MoveOutcome {
                position: current,
                moved: false,
                tiles,
            };
        }

        if let Some(player) = self.players.get_mut(&id) {
            player.position = target;
        }

        if self.doors.get(&target).is_some_and(|door| door.lease.is_none()) {
            tiles.extend(self.activate_door(id, target, now));
        }

        if self.maze.get(target) == Some(Cell::Exit) {
            info!("Player {} reached the exit at ({}, {})", id, target.x, target.y);
        }

        MoveOutcome {
            position: target,
            moved: true,
            tiles,
        }
    }

    /// Retires every door whose lease has expired at `now`.
    ///
    /// Highlighted cells of a retired door revert to path and are returned as
    /// tile updates. Calling this again with the same `now` changes nothing.
    pub fn refresh_doors(&mut self, now: Instant) -> Vec<TileUpdate> {
        let mut expired: Vec<Coord> = self
            .doors
            .iter()
            .filter(|(_, door)| {
                door.lease
                    .as_ref()
                    .is_some_and(|lease| lease.expires_at <= now)
            })
            .map(|(coord, _)| *coord)
            .collect();
        expired.sort();

        let mut tiles = Vec::new();
        for coord in expired {
            let Some(lease) = self.doors.remove(&coord).and_then(|door| door.lease) else {
                continue;
            };

            for cell in lease.highlight {
                if self.maze.get(cell) == Some(Cell::Highlight) {
                    self.maze.set(cell, Cell::Path);
                    tiles.push(TileUpdate::new(cell, Cell::Path));
                }
            }
            info!(
                "Door at ({}, {}) expired, lease held by {}",
                coord.x, coord.y, lease.occupant
            );
        }
        tiles
    }

    /// Bounds, wall and door checks for entering `target`.
    fn can_enter(&self, id: PlayerId, target: Coord) -> bool {
        match self.maze.get(target) {
            None | Some(Cell::Wall) => return false,
            Some(_) => {}
        }

        match self.doors.get(&target) {
            None => true,
            Some(Door { lease: None }) => true,
            Some(Door { lease: Some(lease) }) => lease.occupant == id,
        }
    }

    fn activate_door(&mut self, id: PlayerId, door: Coord, now: Instant) -> Vec<TileUpdate> {
        let highlight = self.highlight_zone(door);
        let tiles: Vec<TileUpdate> = highlight
            .iter()
            .map(|&cell| TileUpdate::new(cell, Cell::Highlight))
            .collect();

        for &cell in &highlight {
            self.maze.set(cell, Cell::Highlight);
        }

        info!(
            "Player {} took door at ({}, {}), {} cells reserved",
            id,
            door.x,
            door.y,
            highlight.len()
        );

        if let Some(state) = self.doors.get_mut(&door) {
            state.lease = Some(Lease {
                occupant: id,
                expires_at: now + DOOR_LEASE,
                highlight,
            });
        }
        tiles
    }

    /// Breadth-first walk from the door over plain path cells, capped at
    /// [`HIGHLIGHT_LIMIT`] cells including the door.
    fn highlight_zone(&self, door: Coord) -> Vec<Coord> {
        let mut zone = vec![door];
        let mut seen = HashSet::from([door]);
        let mut frontier = VecDeque::from([door]);

        while let Some(current) = frontier.pop_front() {
            for next in current.neighbors() {
                if zone.len() >= HIGHLIGHT_LIMIT {
                    return zone;
                }
                if self.maze.get(next) == Some(Cell::Path) && seen.insert(next) {
                    zone.push(next);
                    frontier.push_back(next);
                }
            }
        }
        zone
    }
}
