use core::fmt;

use crate::core::common::BoardError;

pub mod codec;
pub mod frame;

pub use codec::{ClientMessage, ServerMessage};
pub use frame::{FrameError, FrameStage, Packet};

/// A well-framed packet whose content cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Type tag outside the known set.
    UnknownPacketType(u8),
    /// Fixed-size payload with the wrong length.
    UnexpectedLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Variable-size payload ending in the middle of a record.
    Truncated {
        kind: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    InvalidCellTag { tag: u8, offset: usize },
    InvalidMove(u8),
    NotAscii { kind: &'static str },
    Malformed { kind: &'static str, reason: String },
    /// Coordinates or dimensions the board cannot accept.
    Board(BoardError),
    /// Packet type not allowed in the current session state.
    Unexpected { kind: &'static str, state: &'static str },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownPacketType(tag) => write!(f, "unknown packet type {}", tag),
            ProtocolError::UnexpectedLength {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "{} payload must be {} bytes, got {}",
                kind, expected, actual
            ),
            ProtocolError::Truncated {
                kind,
                offset,
                needed,
                available,
            } => write!(
                f,
                "{} payload truncated at byte {}: need {} bytes, {} left",
                kind, offset, needed, available
            ),
            ProtocolError::InvalidCellTag { tag, offset } => {
                write!(f, "invalid cell tag {} at byte {}", tag, offset)
            }
            ProtocolError::InvalidMove(index) => write!(f, "invalid move index {}", index),
            ProtocolError::NotAscii { kind } => write!(f, "{} payload is not ASCII", kind),
            ProtocolError::Malformed { kind, reason } => {
                write!(f, "malformed {} payload: {}", kind, reason)
            }
            ProtocolError::Board(e) => write!(f, "{}", e),
            ProtocolError::Unexpected { kind, state } => {
                write!(f, "unexpected {} while {}", kind, state)
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Board(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BoardError> for ProtocolError {
    fn from(e: BoardError) -> Self {
        ProtocolError::Board(e)
    }
}
