//! Per-game state: the records announced by the server and the board they
//! drive.

use alloc::vec::Vec;

use crate::core::{
    board::Board,
    common::{BoardError, Cell, GridMismatch, Move, Pos, SnakeId},
};

/// Parameters announced by the server when a game begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameStart {
    pub rows: u32,
    pub cols: u32,
    pub snake_id: SnakeId,
}

/// Final standings for this client's snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameResults {
    pub died: bool,
    pub length: u32,
    pub score: i32,
    pub died_on_turn: u32,
    pub rank: u32,
    pub num_ties: u32,
    pub new_elo: i32,
}

/// New content of one square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub pos: Pos,
    pub cell: Cell,
}

/// Per-turn delta: where our head is, which turn it is, and what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameChanges {
    pub head: Pos,
    pub turn: u32,
    pub updates: Vec<CellUpdate>,
}

/// Everything the client knows about the running game.
#[derive(Debug, Clone)]
pub struct GameState {
    snake_id: SnakeId,
    board: Board,
    turn: u32,
    head: Pos,
}

impl GameState {
    /// Allocate an all-empty board for a freshly announced game.
    pub fn start(start: GameStart) -> Result<Self, BoardError> {
        Ok(Self {
            snake_id: start.snake_id,
            board: Board::allocate(start.rows, start.cols)?,
            turn: 0,
            head: Pos::default(),
        })
    }

    pub fn snake_id(&self) -> SnakeId {
        self.snake_id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn rows(&self) -> u32 {
        self.board.rows()
    }

    pub fn cols(&self) -> u32 {
        self.board.cols()
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Head of our own snake as of the last GameChanges.
    pub fn head(&self) -> Pos {
        self.head
    }

    /// Record the head position and turn carried by a GameChanges header.
    pub fn advance(&mut self, head: Pos, turn: u32) {
        self.head = head;
        self.turn = turn;
    }

    /// Write one delta into the board, returning the previous cell.
    pub fn apply_update(&mut self, update: CellUpdate) -> Result<Cell, BoardError> {
        self.board.set(update.pos.row, update.pos.col, update.cell)
    }

    /// Compare a full-grid snapshot with the tracked board.
    pub fn check_grid(&self, cells: &[Cell]) -> Result<Vec<GridMismatch>, BoardError> {
        self.board.diff(cells)
    }

    /// In-bounds neighbours of `pos` with the move that reaches them.
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = (Move, Pos)> + '_ {
        Move::ALL.into_iter().filter_map(move |mv| {
            pos.step(mv)
                .filter(|next| self.board.contains(*next))
                .map(|next| (mv, next))
        })
    }

    /// Moves from our head onto squares that can be occupied.
    pub fn safe_moves(&self) -> Vec<Move> {
        self.neighbours(self.head)
            .filter(|(_, next)| self.board.cell(*next).is_some_and(|c| c.can_occupy()))
            .map(|(mv, _)| mv)
            .collect()
    }
}
