//! Common types: moves, positions, cells, colours and board errors.

use core::fmt;
use core::str::FromStr;

use super::config::{CELL_EMPTY, CELL_FOOD, CELL_SNAKE};

/// Identifier the server assigns to each snake.
pub type SnakeId = u32;

/// One of the four directions a snake head can travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
}

impl Move {
    /// All moves in wire-index order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    /// Index sent in a MoveResponse.
    pub const fn index(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Right => 1,
            Move::Down => 2,
            Move::Left => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Move> {
        Move::ALL.get(index as usize).copied()
    }

    /// (row delta, col delta). Row 0 is the top of the board.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Move::Up => (-1, 0),
            Move::Right => (0, 1),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
        }
    }

    /// Plain vector addition, no bounds applied. Saturates at the ends of
    /// the `i64` range.
    pub fn apply(self, row: i64, col: i64) -> (i64, i64) {
        let (dr, dc) = self.delta();
        (row.saturating_add(dr as i64), col.saturating_add(dc as i64))
    }

    pub const fn opposite(self) -> Move {
        match self {
            Move::Up => Move::Down,
            Move::Right => Move::Left,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Right => "right",
            Move::Down => "down",
            Move::Left => "left",
        };
        f.write_str(name)
    }
}

/// Board coordinate as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Pos {
    pub row: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Neighbouring position in direction `mv`, or `None` if it would leave
    /// the unsigned coordinate space.
    pub fn step(self, mv: Move) -> Option<Pos> {
        let (dr, dc) = mv.delta();
        Some(Pos {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// State of a single board square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    #[default]
    Empty,
    Food,
    Snake(SnakeId),
}

impl Cell {
    /// A head may move onto empty squares and food.
    pub fn can_occupy(&self) -> bool {
        matches!(self, Cell::Empty | Cell::Food)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_food(&self) -> bool {
        matches!(self, Cell::Food)
    }

    pub fn is_snake(&self) -> bool {
        matches!(self, Cell::Snake(_))
    }

    pub fn snake_id(&self) -> Option<SnakeId> {
        match self {
            Cell::Snake(id) => Some(*id),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Cell::Empty => CELL_EMPTY,
            Cell::Food => CELL_FOOD,
            Cell::Snake(_) => CELL_SNAKE,
        }
    }

    /// Builds a cell from its wire tag. `id` is ignored unless the tag is
    /// the snake tag.
    pub fn from_wire(tag: u8, id: SnakeId) -> Option<Cell> {
        match tag {
            CELL_EMPTY => Some(Cell::Empty),
            CELL_FOOD => Some(Cell::Food),
            CELL_SNAKE => Some(Cell::Snake(id)),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("empty"),
            Cell::Food => f.write_str("food"),
            Cell::Snake(id) => write!(f, "snake #{}", id),
        }
    }
}

/// Player colour sent during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Error returned when a colour string is neither `r,g,b` nor `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbParseError;

impl fmt::Display for RgbParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected a colour as `r,g,b` (0-255 each) or `#rrggbb`")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RgbParseError {}

impl FromStr for Rgb {
    type Err = RgbParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(RgbParseError);
            }
            let channel =
                |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| RgbParseError);
            return Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
        }
        let mut parts = s.split(',').map(|p| p.trim().parse::<u8>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) => Ok(Rgb::new(r, g, b)),
            _ => Err(RgbParseError),
        }
    }
}

/// Errors returned by Board and GameState operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate lies outside the allocated board.
    OutOfBounds { pos: Pos, rows: u32, cols: u32 },
    /// rows * cols overflows or exceeds `MAX_BOARD_CELLS`.
    TooLarge { rows: u32, cols: u32 },
    /// Full-grid snapshot does not cover the board exactly.
    SnapshotSize { expected: usize, actual: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::OutOfBounds { pos, rows, cols } => {
                write!(f, "position {} is outside the {}x{} board", pos, rows, cols)
            }
            BoardError::TooLarge { rows, cols } => {
                write!(f, "board of {}x{} cells is too large", rows, cols)
            }
            BoardError::SnapshotSize { expected, actual } => write!(
                f,
                "grid snapshot has {} cells, board has {}",
                actual, expected
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}

/// A cell where a full-grid snapshot disagrees with the tracked board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridMismatch {
    pub pos: Pos,
    pub local: Cell,
    pub remote: Cell,
}

impl fmt::Display for GridMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "square {} is {} locally but {} on the server",
            self.pos, self.local, self.remote
        )
    }
}
