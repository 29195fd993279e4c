//! Session state machine: handshake, turn loop and terminal messages.

use core::fmt;
use std::io;

use crate::{
    config::{ClientConfig, ConfigError, Identity},
    core::{
        common::BoardError,
        config::TAG_CONNECTION_ESTABLISHED,
        game::{GameResults, GameState},
    },
    player::Player,
    protocol::{ClientMessage, FrameError, ProtocolError, ServerMessage},
    transport::{tcp::TcpTransport, Transport},
};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Our snake was eliminated; results may still arrive.
    Died,
    /// GameResults received.
    Finished,
    /// Aborted on a framing, decoding or protocol error.
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Handshaking,
    Playing,
    Terminated(Termination),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Handshaking => "handshaking",
            SessionState::Playing => "playing",
            SessionState::Terminated(Termination::Died) => "dead",
            SessionState::Terminated(Termination::Finished) => "finished",
            SessionState::Terminated(Termination::Errored) => "errored",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the server did not accept us.
#[derive(Debug)]
pub enum HandshakeError {
    /// First reply was a packet other than ConnectionEstablished.
    UnexpectedPacket(u8),
    Framing(FrameError),
    /// ConnectionEstablished arrived with a payload.
    Protocol(ProtocolError),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::UnexpectedPacket(kind) => write!(
                f,
                "expected ConnectionEstablished (type {}), got packet type {}",
                TAG_CONNECTION_ESTABLISHED, kind
            ),
            HandshakeError::Framing(e) => write!(f, "{}", e),
            HandshakeError::Protocol(e) => write!(f, "{}", e),
        }
    }
}

/// Fatal session errors. Every variant ends the session.
#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Connect(io::Error),
    Framing(FrameError),
    Handshake(HandshakeError),
    Protocol(ProtocolError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "configuration error: {}", e),
            SessionError::Connect(e) => write!(f, "could not connect: {}", e),
            SessionError::Framing(e) => write!(f, "framing error: {}", e),
            SessionError::Handshake(e) => write!(f, "handshake failed: {}", e),
            SessionError::Protocol(e) => write!(f, "protocol error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(e) => Some(e),
            SessionError::Connect(e) => Some(e),
            SessionError::Framing(e) => Some(e),
            SessionError::Handshake(HandshakeError::Framing(e)) => Some(e),
            SessionError::Handshake(HandshakeError::Protocol(e)) => Some(e),
            SessionError::Handshake(HandshakeError::UnexpectedPacket(_)) => None,
            SessionError::Protocol(e) => Some(e),
        }
    }
}

impl From<ProtocolError> for SessionError {
    fn from(e: ProtocolError) -> Self {
        SessionError::Protocol(e)
    }
}

impl From<BoardError> for SessionError {
    fn from(e: BoardError) -> Self {
        SessionError::Protocol(ProtocolError::Board(e))
    }
}

/// Summary of a completed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub results: GameResults,
    pub death_reason: Option<String>,
    /// MoveResponses sent.
    pub turns: u32,
    /// Squares reported by full-grid checks as out of sync.
    pub mismatches: usize,
}

fn unexpected(kind: &'static str, state: &'static str) -> SessionError {
    SessionError::Protocol(ProtocolError::Unexpected { kind, state })
}

/// One connection to the game server, driving a [`Player`].
pub struct Session {
    identity: Identity,
    player: Box<dyn Player>,
    transport: Box<dyn Transport>,
    state: SessionState,
    game: Option<GameState>,
    death_reason: Option<String>,
    turns: u32,
    mismatches: usize,
}

impl Session {
    pub fn new(identity: Identity, player: Box<dyn Player>, transport: Box<dyn Transport>) -> Self {
        Self {
            identity,
            player,
            transport,
            state: SessionState::Disconnected,
            game: None,
            death_reason: None,
            turns: 0,
            mismatches: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Game state once GameStart has been received.
    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    /// Play until GameResults or the first fatal error. The transport is
    /// closed before returning either way.
    pub async fn run(&mut self) -> Result<SessionOutcome, SessionError> {
        let result = self.drive().await;
        if let Err(e) = &result {
            self.state = SessionState::Terminated(Termination::Errored);
            log::error!("session aborted: {}", e);
        }
        if let Err(e) = self.transport.close().await {
            log::debug!("closing transport: {}", e);
        }
        result
    }

    async fn drive(&mut self) -> Result<SessionOutcome, SessionError> {
        self.handshake().await?;
        // Only GameResults leaves the loop; after it nothing more is read.
        loop {
            let packet = self.transport.recv().await.map_err(SessionError::Framing)?;
            let msg = ServerMessage::decode(&packet)?;
            if let Some(results) = self.dispatch(msg).await? {
                return Ok(SessionOutcome {
                    results,
                    death_reason: self.death_reason.take(),
                    turns: self.turns,
                    mismatches: self.mismatches,
                });
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Handshaking;
        let hello = ClientMessage::NameAndColor {
            color: self.identity.color(),
            name: self.identity.name().to_string(),
        };
        self.transport
            .send(hello.encode())
            .await
            .map_err(|e| SessionError::Handshake(HandshakeError::Framing(e)))?;

        let reply = self
            .transport
            .recv()
            .await
            .map_err(|e| SessionError::Handshake(HandshakeError::Framing(e)))?;
        if reply.kind != TAG_CONNECTION_ESTABLISHED {
            return Err(SessionError::Handshake(HandshakeError::UnexpectedPacket(
                reply.kind,
            )));
        }
        ServerMessage::decode(&reply)
            .map_err(|e| SessionError::Handshake(HandshakeError::Protocol(e)))?;

        log::info!("connected as {:?}", self.identity.name());
        self.state = SessionState::Playing;
        Ok(())
    }

    /// Describes where we are for error messages.
    fn phase(&self) -> &'static str {
        match (self.state, &self.game) {
            (SessionState::Playing, None) => "waiting for game start",
            (state, _) => state.name(),
        }
    }

    /// React to one message. Returns the results once the game is over.
    async fn dispatch(&mut self, msg: ServerMessage) -> Result<Option<GameResults>, SessionError> {
        let phase = self.phase();
        let kind = msg.name();
        match msg {
            ServerMessage::ConnectionEstablished => return Err(unexpected(kind, phase)),
            ServerMessage::GameStart(start) => {
                if self.game.is_some() {
                    return Err(unexpected(kind, "in a game"));
                }
                let game = GameState::start(start)?;
                log::info!(
                    "game started: {}x{} board, we are snake {}",
                    start.rows,
                    start.cols,
                    start.snake_id
                );
                self.player.on_game_start(&game);
                self.game = Some(game);
            }
            ServerMessage::GameChanges(changes) => {
                let game = self.game.as_mut().ok_or(unexpected(kind, phase))?;
                game.advance(changes.head, changes.turn);
                for update in changes.updates {
                    let old = game.apply_update(update)?;
                    self.player
                        .on_square_updated(game, update.pos, old, update.cell);
                }
            }
            ServerMessage::WholeGrid(cells) => {
                let game = self.game.as_ref().ok_or(unexpected(kind, phase))?;
                let mismatches = game.check_grid(&cells)?;
                for mismatch in &mismatches {
                    log::warn!("grid out of sync on turn {}: {}", game.turn(), mismatch);
                    self.player.on_grid_mismatch(game, mismatch);
                }
                self.mismatches += mismatches.len();
            }
            ServerMessage::MoveRequest => {
                if self.state != SessionState::Playing {
                    return Err(unexpected(kind, phase));
                }
                let game = self.game.as_ref().ok_or(unexpected(kind, phase))?;
                let mv = self.player.select_move(game);
                log::debug!("turn {}: head {} moving {}", game.turn(), game.head(), mv);
                self.transport
                    .send(ClientMessage::MoveResponse(mv).encode())
                    .await
                    .map_err(SessionError::Framing)?;
                self.turns += 1;
            }
            ServerMessage::SnakeDeath(reason) => {
                if self.state != SessionState::Playing {
                    return Err(unexpected(kind, phase));
                }
                log::info!("snake died: {}", reason);
                self.state = SessionState::Terminated(Termination::Died);
                self.player.on_death(&reason);
                self.death_reason = Some(reason);
            }
            ServerMessage::GameResults(results) => {
                log::info!(
                    "game over: rank {} ({} ties), score {}, length {}, elo {}",
                    results.rank,
                    results.num_ties,
                    results.score,
                    results.length,
                    results.new_elo
                );
                self.player.on_results(&results);
                self.state = SessionState::Terminated(Termination::Finished);
                return Ok(Some(results));
            }
        }
        Ok(None)
    }
}

/// Validate `config`, connect, and play one game with `player`.
///
/// Configuration problems are reported before any connection attempt.
pub async fn play(
    config: &ClientConfig,
    player: Box<dyn Player>,
) -> Result<SessionOutcome, SessionError> {
    let identity = config.identity().map_err(SessionError::Config)?;
    log::info!("connecting to {}", config.server);
    let transport = TcpTransport::connect_with(config.server.as_str(), config.transport())
        .await
        .map_err(SessionError::Connect)?;
    Session::new(identity, player, Box::new(transport)).run().await
}
