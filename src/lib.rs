#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod core;
pub mod player;

#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use crate::core::{
    Board, BoardError, Cell, CellUpdate, GameChanges, GameResults, GameStart, GameState,
    GridMismatch, Move, Pos, Rgb, SnakeId,
};
pub use player::{Player, RandomSafePlayer};

#[cfg(feature = "std")]
pub use config::{ClientConfig, ConfigError, Identity};
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use protocol::{ClientMessage, FrameError, Packet, ProtocolError, ServerMessage};
#[cfg(feature = "std")]
pub use session::{
    play, HandshakeError, Session, SessionError, SessionOutcome, SessionState, Termination,
};
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
