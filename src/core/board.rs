//! Row-major grid of cells tracked from server deltas.

use alloc::vec::Vec;
use core::fmt;

use crate::core::common::{BoardError, Cell, GridMismatch, Pos};
use crate::core::config::MAX_BOARD_CELLS;

/// Grid of cells whose dimensions are fixed when the game starts.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    rows: u32,
    cols: u32,
    cells: Vec<Cell>,
}

impl Board {
    /// Allocate a `rows` x `cols` board with every cell empty.
    pub fn allocate(rows: u32, cols: u32) -> Result<Self, BoardError> {
        let len = (rows as usize)
            .checked_mul(cols as usize)
            .filter(|&n| n <= MAX_BOARD_CELLS)
            .ok_or(BoardError::TooLarge { rows, cols })?;
        Ok(Board {
            rows,
            cols,
            cells: alloc::vec![Cell::Empty; len],
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// (rows, cols).
    pub fn dims(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: Pos) -> Result<usize, BoardError> {
        if !self.contains(pos) {
            return Err(BoardError::OutOfBounds {
                pos,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(pos.row as usize * self.cols as usize + pos.col as usize)
    }

    pub fn get(&self, row: u32, col: u32) -> Result<Cell, BoardError> {
        let idx = self.index(Pos::new(row, col))?;
        Ok(self.cells[idx])
    }

    /// Cell at `pos`, or `None` when off the board.
    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        self.index(pos).ok().map(|idx| self.cells[idx])
    }

    /// Replace the cell at (row, col) and return what was there before.
    pub fn set(&mut self, row: u32, col: u32, cell: Cell) -> Result<Cell, BoardError> {
        let idx = self.index(Pos::new(row, col))?;
        Ok(core::mem::replace(&mut self.cells[idx], cell))
    }

    /// Cells with their positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        let cols = self.cols.max(1);
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let pos = Pos::new(i as u32 / cols, i as u32 % cols);
            (pos, *cell)
        })
    }

    /// Compare against a dense row-major snapshot. The board itself is left
    /// untouched.
    pub fn diff(&self, snapshot: &[Cell]) -> Result<Vec<GridMismatch>, BoardError> {
        if snapshot.len() != self.cells.len() {
            return Err(BoardError::SnapshotSize {
                expected: self.cells.len(),
                actual: snapshot.len(),
            });
        }
        Ok(self
            .iter()
            .zip(snapshot)
            .filter(|((_, local), remote)| local != *remote)
            .map(|((pos, local), remote)| GridMismatch {
                pos,
                local,
                remote: *remote,
            })
            .collect())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{} {{", self.rows, self.cols)?;
        for row in self.cells.chunks(self.cols.max(1) as usize) {
            f.write_str("  ")?;
            for cell in row {
                let c = match cell {
                    Cell::Empty => '.',
                    Cell::Food => '*',
                    Cell::Snake(id) => char::from_digit(id % 36, 36).unwrap_or('#'),
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        f.write_str("}")
    }
}
