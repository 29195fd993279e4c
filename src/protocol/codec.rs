//! Payload encoding for both directions of the protocol.
//!
//! Fixed-layout records go through `bincode` with fixed-width little-endian
//! integers, which matches the packed structs the server writes. Lengths are
//! checked by hand first so errors can name expected and actual sizes.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::{
    common::{Cell, Move, Pos, Rgb},
    config::*,
    game::{CellUpdate, GameChanges, GameResults, GameStart},
};
use crate::protocol::{frame::Packet, ProtocolError};

fn wire() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

fn read<T: DeserializeOwned>(kind: &'static str, bytes: &[u8]) -> Result<T, ProtocolError> {
    wire()
        .deserialize(bytes)
        .map_err(|e| ProtocolError::Malformed {
            kind,
            reason: e.to_string(),
        })
}

fn write<T: Serialize>(
    kind: &'static str,
    out: &mut Vec<u8>,
    value: &T,
) -> Result<(), ProtocolError> {
    wire()
        .serialize_into(out, value)
        .map_err(|e| ProtocolError::Malformed {
            kind,
            reason: e.to_string(),
        })
}

fn expect_len(kind: &'static str, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() != expected {
        return Err(ProtocolError::UnexpectedLength {
            kind,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct ChangesHeader {
    head_row: u32,
    head_col: u32,
    turn: u32,
}

#[derive(Serialize, Deserialize)]
struct UpdatePrefix {
    row: u32,
    col: u32,
    tag: u8,
}

#[derive(Serialize, Deserialize)]
struct GridCell {
    tag: u8,
    snake_id: u32,
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    ConnectionEstablished,
    MoveRequest,
    GameChanges(GameChanges),
    GameStart(GameStart),
    /// Dense row-major snapshot of the whole board.
    WholeGrid(Vec<Cell>),
    SnakeDeath(String),
    GameResults(GameResults),
}

impl ServerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::ConnectionEstablished => "ConnectionEstablished",
            ServerMessage::MoveRequest => "MoveRequest",
            ServerMessage::GameChanges(_) => "GameChanges",
            ServerMessage::GameStart(_) => "GameStart",
            ServerMessage::WholeGrid(_) => "WholeGrid",
            ServerMessage::SnakeDeath(_) => "SnakeDeath",
            ServerMessage::GameResults(_) => "GameResults",
        }
    }

    pub fn kind(&self) -> u8 {
        match self {
            ServerMessage::ConnectionEstablished => TAG_CONNECTION_ESTABLISHED,
            ServerMessage::MoveRequest => TAG_MOVE_REQUEST,
            ServerMessage::GameChanges(_) => TAG_GAME_CHANGES,
            ServerMessage::GameStart(_) => TAG_GAME_START,
            ServerMessage::WholeGrid(_) => TAG_WHOLE_GRID,
            ServerMessage::SnakeDeath(_) => TAG_SNAKE_DEATH,
            ServerMessage::GameResults(_) => TAG_GAME_RESULTS,
        }
    }

    pub fn decode(packet: &Packet) -> Result<Self, ProtocolError> {
        let payload = packet.payload.as_slice();
        match packet.kind {
            TAG_CONNECTION_ESTABLISHED => {
                expect_len("ConnectionEstablished", payload, 0)?;
                Ok(ServerMessage::ConnectionEstablished)
            }
            TAG_MOVE_REQUEST => {
                expect_len("MoveRequest", payload, 0)?;
                Ok(ServerMessage::MoveRequest)
            }
            TAG_GAME_CHANGES => decode_changes(payload).map(ServerMessage::GameChanges),
            TAG_GAME_START => {
                expect_len("GameStart", payload, GAME_START_LEN)?;
                read("GameStart", payload).map(ServerMessage::GameStart)
            }
            TAG_WHOLE_GRID => decode_grid(payload).map(ServerMessage::WholeGrid),
            TAG_SNAKE_DEATH => {
                if !payload.is_ascii() {
                    return Err(ProtocolError::NotAscii { kind: "SnakeDeath" });
                }
                let reason = String::from_utf8_lossy(payload).into_owned();
                Ok(ServerMessage::SnakeDeath(reason))
            }
            TAG_GAME_RESULTS => {
                expect_len("GameResults", payload, GAME_RESULTS_LEN)?;
                read("GameResults", payload).map(ServerMessage::GameResults)
            }
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Build the packet a server would send. Used by test harnesses and
    /// mock servers.
    pub fn encode(&self) -> Result<Packet, ProtocolError> {
        let kind = self.name();
        let mut payload = Vec::new();
        match self {
            ServerMessage::ConnectionEstablished | ServerMessage::MoveRequest => {}
            ServerMessage::GameChanges(changes) => {
                write(
                    kind,
                    &mut payload,
                    &ChangesHeader {
                        head_row: changes.head.row,
                        head_col: changes.head.col,
                        turn: changes.turn,
                    },
                )?;
                for update in &changes.updates {
                    write(
                        kind,
                        &mut payload,
                        &UpdatePrefix {
                            row: update.pos.row,
                            col: update.pos.col,
                            tag: update.cell.tag(),
                        },
                    )?;
                    if let Some(id) = update.cell.snake_id() {
                        write(kind, &mut payload, &id)?;
                    }
                }
            }
            ServerMessage::GameStart(start) => write(kind, &mut payload, start)?,
            ServerMessage::WholeGrid(cells) => {
                for cell in cells {
                    write(
                        kind,
                        &mut payload,
                        &GridCell {
                            tag: cell.tag(),
                            snake_id: cell.snake_id().unwrap_or(0),
                        },
                    )?;
                }
            }
            ServerMessage::SnakeDeath(reason) => payload.extend_from_slice(reason.as_bytes()),
            ServerMessage::GameResults(results) => write(kind, &mut payload, results)?,
        }
        Ok(Packet::new(self.kind(), payload))
    }
}

fn decode_changes(payload: &[u8]) -> Result<GameChanges, ProtocolError> {
    const KIND: &str = "GameChanges";
    if payload.len() < CHANGES_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            kind: KIND,
            offset: 0,
            needed: CHANGES_HEADER_LEN,
            available: payload.len(),
        });
    }
    let header: ChangesHeader = read(KIND, &payload[..CHANGES_HEADER_LEN])?;

    let mut updates = Vec::new();
    let mut offset = CHANGES_HEADER_LEN;
    while offset < payload.len() {
        let rest = &payload[offset..];
        if rest.len() < UPDATE_LEN {
            return Err(ProtocolError::Truncated {
                kind: KIND,
                offset,
                needed: UPDATE_LEN,
                available: rest.len(),
            });
        }
        let prefix: UpdatePrefix = read(KIND, &rest[..UPDATE_LEN])?;
        let (cell, consumed) = if prefix.tag == CELL_SNAKE {
            if rest.len() < SNAKE_UPDATE_LEN {
                return Err(ProtocolError::Truncated {
                    kind: KIND,
                    offset,
                    needed: SNAKE_UPDATE_LEN,
                    available: rest.len(),
                });
            }
            let id: u32 = read(KIND, &rest[UPDATE_LEN..SNAKE_UPDATE_LEN])?;
            (Cell::Snake(id), SNAKE_UPDATE_LEN)
        } else {
            let cell = Cell::from_wire(prefix.tag, 0).ok_or(ProtocolError::InvalidCellTag {
                tag: prefix.tag,
                offset: offset + 8,
            })?;
            (cell, UPDATE_LEN)
        };
        updates.push(CellUpdate {
            pos: Pos::new(prefix.row, prefix.col),
            cell,
        });
        offset += consumed;
    }

    Ok(GameChanges {
        head: Pos::new(header.head_row, header.head_col),
        turn: header.turn,
        updates,
    })
}

fn decode_grid(payload: &[u8]) -> Result<Vec<Cell>, ProtocolError> {
    const KIND: &str = "WholeGrid";
    if payload.len() % GRID_CELL_LEN != 0 {
        return Err(ProtocolError::UnexpectedLength {
            kind: KIND,
            expected: payload.len() - payload.len() % GRID_CELL_LEN,
            actual: payload.len(),
        });
    }
    payload
        .chunks_exact(GRID_CELL_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            let raw: GridCell = read(KIND, chunk)?;
            Cell::from_wire(raw.tag, raw.snake_id).ok_or(ProtocolError::InvalidCellTag {
                tag: raw.tag,
                offset: i * GRID_CELL_LEN,
            })
        })
        .collect()
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    NameAndColor { color: Rgb, name: String },
    MoveResponse(Move),
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ClientMessage::NameAndColor { .. } => "NameAndColor",
            ClientMessage::MoveResponse(_) => "MoveResponse",
        }
    }

    pub fn kind(&self) -> u8 {
        match self {
            ClientMessage::NameAndColor { .. } => TAG_NAME_AND_COLOR,
            ClientMessage::MoveResponse(_) => TAG_MOVE_RESPONSE,
        }
    }

    /// The name goes out as raw bytes; callers validate it is ASCII first
    /// (see `Identity::new`).
    pub fn encode(&self) -> Packet {
        let payload = match self {
            ClientMessage::NameAndColor { color, name } => {
                let mut payload = Vec::with_capacity(COLOR_LEN + name.len());
                payload.extend_from_slice(&[color.r, color.g, color.b]);
                payload.extend_from_slice(name.as_bytes());
                payload
            }
            ClientMessage::MoveResponse(mv) => vec![mv.index()],
        };
        Packet::new(self.kind(), payload)
    }

    pub fn decode(packet: &Packet) -> Result<Self, ProtocolError> {
        let payload = packet.payload.as_slice();
        match packet.kind {
            TAG_NAME_AND_COLOR => {
                if payload.len() < COLOR_LEN {
                    return Err(ProtocolError::Truncated {
                        kind: "NameAndColor",
                        offset: 0,
                        needed: COLOR_LEN,
                        available: payload.len(),
                    });
                }
                let name = &payload[COLOR_LEN..];
                if !name.is_ascii() {
                    return Err(ProtocolError::NotAscii {
                        kind: "NameAndColor",
                    });
                }
                Ok(ClientMessage::NameAndColor {
                    color: Rgb::new(payload[0], payload[1], payload[2]),
                    name: String::from_utf8_lossy(name).into_owned(),
                })
            }
            TAG_MOVE_RESPONSE => {
                expect_len("MoveResponse", payload, 1)?;
                Move::from_index(payload[0])
                    .map(ClientMessage::MoveResponse)
                    .ok_or(ProtocolError::InvalidMove(payload[0]))
            }
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }
}
