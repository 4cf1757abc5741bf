//! Protocol and grid vocabulary shared by the maze server and its clients.
//!
//! The wire format is line oriented ASCII: every message is a single line
//! terminated by `\n`, tokens separated by spaces. Clients send
//! [`ClientMessage`]s, the server answers with [`ServerMessage`]s.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ROWS: usize = 21;
pub const DEFAULT_COLS: usize = 21;
pub const DEFAULT_PORT: u16 = 5001;

/// Every player spawns here; the generator always carves it.
pub const START: Coord = Coord::new(1, 1);

/// How long a door stays reserved for the player who first entered it.
pub const DOOR_LEASE: Duration = Duration::from_secs(5);

/// Maximum number of highlighted cells per door, the door itself included.
pub const HIGHLIGHT_LIMIT: usize = 5;

/// A single maze cell. The numeric codes are part of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Path,
    Wall,
    Exit,
    Door,
    Highlight,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Cell::Path => 0,
            Cell::Wall => 1,
            Cell::Exit => 2,
            Cell::Door => 3,
            Cell::Highlight => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Path),
            1 => Some(Cell::Wall),
            2 => Some(Cell::Exit),
            3 => Some(Cell::Door),
            4 => Some(Cell::Highlight),
            _ => None,
        }
    }

    pub fn digit(self) -> char {
        char::from(b'0' + self.code())
    }

    pub fn from_digit(c: char) -> Option<Self> {
        c.to_digit(10).and_then(|d| Self::from_code(d as u8))
    }

    /// Anything that is not a wall can be stepped on, subject to door rules.
    pub fn is_open(self) -> bool {
        self != Cell::Wall
    }
}

/// Grid coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// The four cardinal neighbours in up, down, left, right order.
    pub fn neighbors(self) -> [Coord; 4] {
        Direction::ALL.map(|d| self.step(d))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step for this direction; `y` grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            _ => Err(()),
        }
    }
}

/// Server assigned player identity, rendered as `p<n>` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('p')
            .and_then(|n| n.parse().ok())
            .map(PlayerId)
            .ok_or(())
    }
}

/// A cell whose value changed as a side effect of door activation or expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileUpdate {
    pub coord: Coord,
    pub cell: Cell,
}

impl TileUpdate {
    pub fn new(coord: Coord, cell: Cell) -> Self {
        Self { coord, cell }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Join,
    Move(Direction),
}

impl ClientMessage {
    /// Parses one inbound line. Unknown commands and wrong arity yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["JOIN"] => Some(ClientMessage::Join),
            ["MOVE", direction] => direction.parse().ok().map(ClientMessage::Move),
            _ => None,
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Join => write!(f, "JOIN"),
            ClientMessage::Move(direction) => write!(f, "MOVE {}", direction.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Welcome(PlayerId),
    Spawn(Coord),
    MazeRow(Vec<Cell>),
    Pos(PlayerId, Coord),
    Tile(TileUpdate),
}

impl ServerMessage {
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["WELCOME", id] => id.parse().ok().map(ServerMessage::Welcome),
            ["SPAWN", x, y] => Some(ServerMessage::Spawn(Coord::new(
                x.parse().ok()?,
                y.parse().ok()?,
            ))),
            ["MAZEROW", digits] => digits
                .chars()
                .map(Cell::from_digit)
                .collect::<Option<Vec<_>>>()
                .map(ServerMessage::MazeRow),
            ["POS", id, x, y] => Some(ServerMessage::Pos(
                id.parse().ok()?,
                Coord::new(x.parse().ok()?, y.parse().ok()?),
            )),
            ["TILE", x, y, value] => {
                let coord = Coord::new(x.parse().ok()?, y.parse().ok()?);
                let cell = Cell::from_code(value.parse().ok()?)?;
                Some(ServerMessage::Tile(TileUpdate::new(coord, cell)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome(id) => write!(f, "WELCOME {}", id),
            ServerMessage::Spawn(pos) => write!(f, "SPAWN {} {}", pos.x, pos.y),
            ServerMessage::MazeRow(cells) => {
                let digits: String = cells.iter().map(|c| c.digit()).collect();
                write!(f, "MAZEROW {}", digits)
            }
            ServerMessage::Pos(id, pos) => write!(f, "POS {} {} {}", id, pos.x, pos.y),
            ServerMessage::Tile(update) => write!(
                f,
                "TILE {} {} {}",
                update.coord.x,
                update.coord.y,
                update.cell.code()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_codes() {
        for code in 0..=4u8 {
            let cell = Cell::from_code(code).unwrap();
            assert_eq!(cell.code(), code);
            assert_eq!(Cell::from_digit(cell.digit()), Some(cell));
        }
        assert_eq!(Cell::from_code(5), None);
        assert_eq!(Cell::from_digit('x'), None);
        assert!(!Cell::Wall.is_open());
        assert!(Cell::Door.is_open());
    }

    #[test]
    fn test_coord_step() {
        let start = START;
        assert_eq!(start.step(Direction::Up), Coord::new(1, 0));
        assert_eq!(start.step(Direction::Down), Coord::new(1, 2));
        assert_eq!(start.step(Direction::Left), Coord::new(0, 1));
        assert_eq!(start.step(Direction::Right), Coord::new(2, 1));
        assert_eq!(Coord::new(0, 0).step(Direction::Left), Coord::new(-1, 0));
    }

    #[test]
    fn test_player_id_format() {
        assert_eq!(PlayerId(1).to_string(), "p1");
        assert_eq!("p42".parse::<PlayerId>(), Ok(PlayerId(42)));
        assert!("42".parse::<PlayerId>().is_err());
        assert!("px".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_parse_join() {
        assert_eq!(ClientMessage::parse("JOIN"), Some(ClientMessage::Join));
        assert_eq!(ClientMessage::parse("  JOIN \r"), Some(ClientMessage::Join));
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            ClientMessage::parse("MOVE UP"),
            Some(ClientMessage::Move(Direction::Up))
        );
        assert_eq!(
            ClientMessage::parse("MOVE RIGHT"),
            Some(ClientMessage::Move(Direction::Right))
        );
    }

    #[test]
    fn test_parse_malformed_is_ignored() {
        assert_eq!(ClientMessage::parse(""), None);
        assert_eq!(ClientMessage::parse("MOVE"), None);
        assert_eq!(ClientMessage::parse("MOVE UP NOW"), None);
        assert_eq!(ClientMessage::parse("MOVE NORTH"), None);
        assert_eq!(ClientMessage::parse("JUMP"), None);
    }

    #[test]
    fn test_client_message_format() {
        assert_eq!(ClientMessage::Join.to_string(), "JOIN");
        assert_eq!(
            ClientMessage::Move(Direction::Down).to_string(),
            "MOVE DOWN"
        );
    }

    #[test]
    fn test_server_message_format() {
        assert_eq!(ServerMessage::Welcome(PlayerId(1)).to_string(), "WELCOME p1");
        assert_eq!(ServerMessage::Spawn(START).to_string(), "SPAWN 1 1");
        assert_eq!(
            ServerMessage::MazeRow(vec![Cell::Wall, Cell::Path, Cell::Door, Cell::Exit])
                .to_string(),
            "MAZEROW 1032"
        );
        assert_eq!(
            ServerMessage::Pos(PlayerId(3), Coord::new(5, 7)).to_string(),
            "POS p3 5 7"
        );
        assert_eq!(
            ServerMessage::Tile(TileUpdate::new(Coord::new(4, 2), Cell::Highlight)).to_string(),
            "TILE 4 2 4"
        );
    }

    #[test]
    fn test_server_message_parse() {
        assert_eq!(
            ServerMessage::parse("POS p2 3 9"),
            Some(ServerMessage::Pos(PlayerId(2), Coord::new(3, 9)))
        );
        assert_eq!(
            ServerMessage::parse("MAZEROW 10401"),
            Some(ServerMessage::MazeRow(vec![
                Cell::Wall,
                Cell::Path,
                Cell::Highlight,
                Cell::Path,
                Cell::Wall
            ]))
        );
        assert_eq!(ServerMessage::parse("MAZEROW 1091"), None);
        assert_eq!(ServerMessage::parse("TILE 1 1 7"), None);
        assert_eq!(ServerMessage::parse("POS p2 3"), None);
    }
}
