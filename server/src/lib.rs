//! # Maze Server Library
//!
//! This library provides the authoritative server for the shared maze game.
//! It owns the canonical maze and player state, decides which moves are
//! legal, and broadcasts every change to all connected clients over
//! newline-delimited TCP.
//!
//! ## Core Responsibilities
//!
//! ### Maze Generation
//! A depth-first backtracker carves a fully connected maze with a single
//! exit, a few extra loops and a handful of single-use doors placed on
//! plain corridors.
//!
//! ### Door Leases
//! The first player to step onto a door gets it, plus a few neighbouring
//! path cells, for five seconds. Nobody else may enter the door until the
//! lease runs out, after which the door is retired and its cells turn back
//! into ordinary path. Expiry is evaluated lazily at the start of every move.
//!
//! ### State Broadcasting
//! Joins, moves and disconnects are followed by a batch of `POS` lines for
//! every player; cell changes caused by doors go out as `TILE` lines first.
//!
//! ## Architecture Design
//!
//! ### One Lock
//! The game state and the connection registry live together in a
//! [`session::Session`] behind a single mutex. Each operation, including its
//! broadcast, runs to completion while holding it, which gives every client
//! the same serial order of events.
//!
//! ### One Task Per Connection
//! Every accepted socket gets a reader task that parses protocol lines and a
//! writer task fed through a channel. A writer that fails to write exits,
//! and the next broadcast that cannot reach it prunes the player.
//!
//! ## Module Organization
//!
//! - `maze`: grid type and generator
//! - `game`: players, doors and the move rules
//! - `client_manager`: registry of live connections
//! - `session`: lock-scoped join/move/disconnect plus broadcasting
//! - `network`: TCP listener and per-connection tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::maze::{Maze, MazeConfig};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let maze = Maze::generate(&MazeConfig::default(), &mut rand::thread_rng());
//!     let server = Server::bind("127.0.0.1:5001", maze).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod maze;
pub mod network;
pub mod session;
