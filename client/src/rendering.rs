//! ASCII rendering of the client's view of the maze

use crate::game::ClientGameState;
use shared::{Cell, Coord};
use std::time::Duration;

fn glyph(cell: Cell) -> char {
    match cell {
        Cell::Path => ' ',
        Cell::Wall => '#',
        Cell::Exit => 'E',
        Cell::Door => 'D',
        Cell::Highlight => '+',
    }
}

/// Draws the maze with `@` for our own player and `o` for everyone else.
pub fn render(state: &ClientGameState) -> String {
    let mut out = String::new();
    for (y, row) in state.maze.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            let coord = Coord::new(x as i32, y as i32);
            let mut ch = glyph(cell);
            for (id, pos) in &state.players {
                if *pos == coord {
                    if Some(*id) == state.my_id {
                        ch = '@';
                        break;
                    }
                    ch = 'o';
                }
            }
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// Line printed once our player reaches the exit, with time since joining.
pub fn win_banner(elapsed: Duration) -> String {
    format!("You reached the exit! Time: {:.2}s", elapsed.as_secs_f64())
}
