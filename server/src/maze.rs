//! Procedural maze generation
//!
//! Mazes are carved with an iterative depth-first backtracker starting at
//! [`START`], which yields a spanning tree over the odd coordinates. A few
//! extra openings are punched into straight wall gaps to add loops, the exit
//! is placed as close to the bottom-right corner as possible, and doors are
//! dropped onto simple corridor cells.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Cell, Coord, DEFAULT_COLS, DEFAULT_ROWS, START};

/// Sampling attempts allowed per requested loop.
const LOOP_ATTEMPTS: usize = 50;
/// Sampling attempts allowed per requested door.
const DOOR_ATTEMPTS: usize = 100;
const MIN_SIDE: usize = 5;

/// Knobs for [`Maze::generate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeConfig {
    pub rows: usize,
    pub cols: usize,
    /// Upper bound on extra openings added after the carve
    pub loops: usize,
    /// Target door count; fewer are placed if sampling runs out
    pub doors: usize,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            loops: 10,
            doors: 5,
        }
    }
}

/// Rectangular grid of cells plus the exit and the doors placed at generation.
///
/// The shape never changes after generation; only door and highlight cells
/// are rewritten while the game runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    cells: Vec<Vec<Cell>>,
    exit: Coord,
    doors: Vec<Coord>,
}

impl Maze {
    /// Generates a random maze. Dimensions are bumped to odd values of at
    /// least five so the carve always has room.
    pub fn generate<R: Rng + ?Sized>(config: &MazeConfig, rng: &mut R) -> Self {
        let rows = normalize_side(config.rows);
        let cols = normalize_side(config.cols);

        let mut maze = Self::filled(rows, cols, Cell::Wall);
        maze.carve(rng);
        maze.add_loops(config.loops, rng);
        maze.place_exit();
        maze.place_doors(config.doors, rng);

        debug!(
            "Generated {}x{} maze, exit at ({}, {}), {} doors",
            rows,
            cols,
            maze.exit.x,
            maze.exit.y,
            maze.doors.len()
        );
        maze
    }

    /// Builds a maze from rows of cell digits, e.g. `"10301"`.
    ///
    /// Returns `None` for empty or ragged input, unknown digits, or a grid
    /// without an exit.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let cells = rows
            .iter()
            .map(|row| row.chars().map(Cell::from_digit).collect::<Option<Vec<_>>>())
            .collect::<Option<Vec<_>>>()?;

        let width = cells.first()?.len();
        if width == 0 || cells.iter().any(|row| row.len() != width) {
            return None;
        }

        let mut exit = None;
        let mut doors = Vec::new();
        for (y, row) in cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let coord = Coord::new(x as i32, y as i32);
                match cell {
                    Cell::Exit if exit.is_none() => exit = Some(coord),
                    Cell::Door => doors.push(coord),
                    _ => {}
                }
            }
        }

        Some(Self {
            cells,
            exit: exit?,
            doors,
        })
    }

    fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Self {
            cells: vec![vec![cell; cols]; rows],
            exit: Coord::default(),
            doors: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn exit(&self) -> Coord {
        self.exit
    }

    /// Doors placed at generation time, in placement order.
    pub fn doors(&self) -> &[Coord] {
        &self.doors
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.y as usize) < self.rows()
            && (coord.x as usize) < self.cols()
    }

    pub fn get(&self, coord: Coord) -> Option<Cell> {
        if !self.contains(coord) {
            return None;
        }
        Some(self.cells[coord.y as usize][coord.x as usize])
    }

    pub(crate) fn set(&mut self, coord: Coord, cell: Cell) {
        if self.contains(coord) {
            self.cells[coord.y as usize][coord.x as usize] = cell;
        }
    }

    /// Number of cardinal neighbours that are not walls.
    pub fn open_neighbors(&self, coord: Coord) -> usize {
        coord
            .neighbors()
            .iter()
            .filter(|&&n| self.get(n).is_some_and(Cell::is_open))
            .count()
    }

    fn is_interior(&self, coord: Coord) -> bool {
        coord.x >= 1
            && coord.y >= 1
            && (coord.x as usize) < self.cols() - 1
            && (coord.y as usize) < self.rows() - 1
    }

    fn random_interior<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        Coord::new(
            rng.gen_range(1..self.cols() as i32 - 1),
            rng.gen_range(1..self.rows() as i32 - 1),
        )
    }

    fn carve<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut steps = [(0, -2), (0, 2), (-2, 0), (2, 0)];
        let mut stack = vec![START];
        self.set(START, Cell::Path);

        while let Some(&current) = stack.last() {
            steps.shuffle(rng);
            let next = steps.iter().find_map(|&(dx, dy)| {
                let target = current.offset(dx, dy);
                let carvable = self.is_interior(target) && self.get(target) == Some(Cell::Wall);
                carvable.then(|| (target, current.offset(dx / 2, dy / 2)))
            });

            match next {
                Some((target, between)) => {
                    self.set(between, Cell::Path);
                    self.set(target, Cell::Path);
                    stack.push(target);
                }
                None => {
                    stack.pop();
                }
            }
        }
    }

    fn add_loops<R: Rng + ?Sized>(&mut self, loops: usize, rng: &mut R) {
        let mut added = 0;
        for _ in 0..loops * LOOP_ATTEMPTS {
            if added >= loops {
                break;
            }

            let coord = self.random_interior(rng);
            if self.get(coord) != Some(Cell::Wall) {
                continue;
            }

            let is_path = |dx, dy| self.get(coord.offset(dx, dy)) == Some(Cell::Path);
            let horizontal_gap = is_path(-1, 0) && is_path(1, 0);
            let vertical_gap = is_path(0, -1) && is_path(0, 1);

            if horizontal_gap || vertical_gap {
                self.set(coord, Cell::Path);
                added += 1;
            }
        }
        debug!("Opened {} of {} loops", added, loops);
    }

    /// Marks the path cell nearest the bottom-right corner as the exit,
    /// forcing the corner itself if the scan finds nothing.
    fn place_exit(&mut self) {
        let rows = self.rows() as i32;
        let cols = self.cols() as i32;

        for y in (1..rows - 1).rev() {
            for x in (1..cols - 1).rev() {
                let coord = Coord::new(x, y);
                if self.get(coord) == Some(Cell::Path) {
                    self.set(coord, Cell::Exit);
                    self.exit = coord;
                    return;
                }
            }
        }

        let corner = Coord::new(cols - 2, rows - 2);
        self.set(corner, Cell::Exit);
        self.exit = corner;
    }

    fn place_doors<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count * DOOR_ATTEMPTS {
            if self.doors.len() >= count {
                break;
            }

            let coord = self.random_interior(rng);
            if coord == START || coord == self.exit || self.get(coord) != Some(Cell::Path) {
                continue;
            }

            if self.open_neighbors(coord) == 2 {
                self.set(coord, Cell::Door);
                self.doors.push(coord);
            }
        }

        if self.doors.len() < count {
            debug!("Placed only {} of {} doors", self.doors.len(), count);
        }
    }
}

/// Generates a maze of the given size with default loop and door counts.
pub fn generate(rows: usize, cols: usize) -> Maze {
    let config = MazeConfig {
        rows,
        cols,
        ..MazeConfig::default()
    };
    Maze::generate(&config, &mut rand::thread_rng())
}

fn normalize_side(side: usize) -> usize {
    let side = side.max(MIN_SIDE);
    if side % 2 == 0 {
        side + 1
    } else {
        side
    }
}
