//! Protocol-independent game model (no_std compatible)
//!
//! Moves, cells, the board and the per-game state only need `alloc`, so this
//! module builds without the `std` feature and can back other front ends.

pub mod board;
pub mod common;
pub mod config;
pub mod game;

// Re-export commonly used types
pub use board::Board;
pub use common::{BoardError, Cell, GridMismatch, Move, Pos, Rgb, RgbParseError, SnakeId};
pub use config::*;
pub use game::{CellUpdate, GameChanges, GameResults, GameStart, GameState};
