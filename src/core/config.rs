//! Wire constants shared by the codec, the framer and the board model.

/// Port the reference server listens on.
pub const DEFAULT_PORT: u16 = 42069;

/// Every frame starts with length (2 bytes LE), type tag and one pad byte.
pub const HEADER_LEN: usize = 4;

// Server -> client type tags.
pub const TAG_CONNECTION_ESTABLISHED: u8 = 0;
pub const TAG_MOVE_REQUEST: u8 = 1;
pub const TAG_GAME_CHANGES: u8 = 2;
pub const TAG_GAME_START: u8 = 3;
pub const TAG_WHOLE_GRID: u8 = 4;
pub const TAG_SNAKE_DEATH: u8 = 5;
pub const TAG_GAME_RESULTS: u8 = 6;

// Client -> server type tags.
pub const TAG_NAME_AND_COLOR: u8 = 0;
pub const TAG_MOVE_RESPONSE: u8 = 1;

// Cell tags.
pub const CELL_EMPTY: u8 = 0;
pub const CELL_FOOD: u8 = 1;
pub const CELL_SNAKE: u8 = 2;

/// (rows, cols, snake id) as three u32.
pub const GAME_START_LEN: usize = 12;
/// (head row, head col, turn) prefix of a GameChanges payload.
pub const CHANGES_HEADER_LEN: usize = 12;
/// Compact update without a snake id: row, col, tag.
pub const UPDATE_LEN: usize = 9;
/// Compact update carrying a snake id.
pub const SNAKE_UPDATE_LEN: usize = 13;
/// Dense WholeGrid cell: tag followed by an always-present id.
pub const GRID_CELL_LEN: usize = 5;
/// died, length, score, died_on_turn, rank, num_ties, new_elo.
pub const GAME_RESULTS_LEN: usize = 21;
/// r, g, b prefix of NameAndColor.
pub const COLOR_LEN: usize = 3;

/// The server keeps at most this many characters of a player name.
pub const SERVER_NAME_LIMIT: usize = 15;

/// Longest accepted name. Keeps the NameAndColor payload within the low
/// header byte, where every known header encoder agrees.
pub const MAX_NAME_LEN: usize = 0xFF - COLOR_LEN;

/// Upper bound on `rows * cols` accepted from a GameStart.
pub const MAX_BOARD_CELLS: usize = 1 << 20;
