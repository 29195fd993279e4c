//! Player trait and implementations
//!
//! A Player is the decision-making side of a session. The session calls
//! `select_move` once per MoveRequest and keeps it informed through the
//! optional notification hooks.

use crate::core::{
    common::{Cell, GridMismatch, Move, Pos},
    game::{GameResults, GameState},
};

/// Interface implemented by move selectors.
pub trait Player: Send {
    /// Choose the next move. Called exactly once per MoveRequest.
    fn select_move(&mut self, state: &GameState) -> Move;

    /// A game has been announced and the board allocated.
    fn on_game_start(&mut self, _state: &GameState) {}

    /// A square changed; `state` already holds the new value.
    fn on_square_updated(&mut self, _state: &GameState, _pos: Pos, _old: Cell, _new: Cell) {}

    /// A full-grid snapshot disagreed with the tracked board at one square.
    fn on_grid_mismatch(&mut self, _state: &GameState, _mismatch: &GridMismatch) {}

    /// Our snake was eliminated. More packets may follow until the results.
    fn on_death(&mut self, _reason: &str) {}

    /// Final standings; the session ends right after this.
    fn on_results(&mut self, _results: &GameResults) {}
}

pub mod ai;
pub use ai::RandomSafePlayer;
