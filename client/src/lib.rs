//! # Maze Console Client
//!
//! A small terminal client for the maze server. It joins on connect, keeps a
//! mirror of the maze and every player's position from the server's
//! broadcasts, and redraws an ASCII map whenever something visible changes.
//!
//! The server is authoritative: the client never moves its own player
//! locally, it only sends `MOVE` requests and waits for the next `POS` batch.
//!
//! ## Module Organization
//!
//! - `game`: state rebuilt from `WELCOME`, `SPAWN`, `MAZEROW`, `POS` and `TILE`
//! - `input`: W/A/S/D/Q console commands
//! - `network`: TCP connection, line framing and the main select loop
//! - `rendering`: ASCII map

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
