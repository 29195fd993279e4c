use std::sync::{Arc, Mutex};
use std::time::Duration;

use snake_client::{
    BoardError, Cell, CellUpdate, ClientMessage, FrameError, GameChanges, GameResults, GameStart,
    GameState, GridMismatch, HandshakeError, Identity, InMemoryTransport, Move, Player, Pos,
    ProtocolError, Rgb, ServerMessage, Session, SessionError, SessionState, Termination,
    Transport,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    GameStart { rows: u32, cols: u32, id: u32 },
    Square { pos: Pos, old: Cell, new: Cell },
    Mismatch(GridMismatch),
    Select { turn: u32, head: Pos },
    Death(String),
    Results(GameResults),
}

struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    mv: Move,
}

impl Recorder {
    fn new(mv: Move) -> (Self, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.clone(),
                mv,
            },
            events,
        )
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Player for Recorder {
    fn select_move(&mut self, state: &GameState) -> Move {
        self.push(Event::Select {
            turn: state.turn(),
            head: state.head(),
        });
        self.mv
    }

    fn on_game_start(&mut self, state: &GameState) {
        self.push(Event::GameStart {
            rows: state.rows(),
            cols: state.cols(),
            id: state.snake_id(),
        });
    }

    fn on_square_updated(&mut self, _state: &GameState, pos: Pos, old: Cell, new: Cell) {
        self.push(Event::Square { pos, old, new });
    }

    fn on_grid_mismatch(&mut self, _state: &GameState, mismatch: &GridMismatch) {
        self.push(Event::Mismatch(*mismatch));
    }

    fn on_death(&mut self, reason: &str) {
        self.push(Event::Death(reason.to_string()));
    }

    fn on_results(&mut self, results: &GameResults) {
        self.push(Event::Results(*results));
    }
}

fn identity() -> Identity {
    Identity::new("tester", Rgb::new(10, 20, 30)).unwrap()
}

fn update(row: u32, col: u32, cell: Cell) -> CellUpdate {
    CellUpdate {
        pos: Pos::new(row, col),
        cell,
    }
}

fn results() -> GameResults {
    GameResults {
        died: true,
        length: 5,
        score: 100,
        died_on_turn: 42,
        rank: 2,
        num_ties: 0,
        new_elo: -15,
    }
}

fn start(rows: u32, cols: u32, snake_id: u32) -> ServerMessage {
    ServerMessage::GameStart(GameStart {
        rows,
        cols,
        snake_id,
    })
}

async fn script(server: &mut InMemoryTransport, msgs: &[ServerMessage]) {
    for msg in msgs {
        server.send(msg.encode().unwrap()).await.unwrap();
    }
}

/// Reads whatever the client left queued and expects the connection to be
/// released afterwards.
async fn assert_client_hung_up(server: &mut InMemoryTransport) {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(1), server.recv())
            .await
            .expect("client left the connection open");
        match next {
            Ok(_) => continue,
            Err(FrameError::Closed { received: 0, .. }) => break,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(matches!(
        server.send(ServerMessage::MoveRequest.encode().unwrap()).await,
        Err(FrameError::PeerClosed)
    ));
}

/// Dense grid for a 10x10 board with the given non-empty cells.
fn grid(cells: &[(u32, u32, Cell)]) -> Vec<Cell> {
    let mut out = vec![Cell::Empty; 100];
    for (row, col, cell) in cells {
        out[(row * 10 + col) as usize] = *cell;
    }
    out
}

#[tokio::test]
async fn full_game_flow() -> anyhow::Result<()> {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(10, 10, 1),
            ServerMessage::GameChanges(GameChanges {
                head: Pos::new(2, 3),
                turn: 1,
                updates: vec![update(2, 3, Cell::Snake(1)), update(5, 5, Cell::Food)],
            }),
            ServerMessage::WholeGrid(grid(&[(2, 3, Cell::Snake(1)), (5, 5, Cell::Food)])),
            ServerMessage::MoveRequest,
            ServerMessage::GameChanges(GameChanges {
                head: Pos::new(2, 4),
                turn: 2,
                updates: vec![update(2, 3, Cell::Empty), update(2, 4, Cell::Snake(1))],
            }),
            ServerMessage::WholeGrid(grid(&[
                (2, 4, Cell::Snake(1)),
                (5, 5, Cell::Food),
                (7, 7, Cell::Food),
            ])),
            ServerMessage::MoveRequest,
            ServerMessage::SnakeDeath("ran into a wall".into()),
            ServerMessage::GameResults(results()),
            ServerMessage::MoveRequest,
        ],
    )
    .await;

    let (player, events) = Recorder::new(Move::Right);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    assert_eq!(session.state(), SessionState::Disconnected);
    let outcome = session.run().await?;

    assert_eq!(outcome.results, results());
    assert_eq!(outcome.death_reason.as_deref(), Some("ran into a wall"));
    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.mismatches, 1);
    assert_eq!(
        session.state(),
        SessionState::Terminated(Termination::Finished)
    );

    // Nothing after GameResults is read.
    assert_eq!(server.queued_outbound(), 1);

    // Mismatch did not correct the board.
    let game = session.game().unwrap();
    assert_eq!(game.board().get(7, 7)?, Cell::Empty);
    assert_eq!(game.board().get(2, 4)?, Cell::Snake(1));
    assert_eq!(game.head(), Pos::new(2, 4));
    assert_eq!(game.turn(), 2);

    // Client sent exactly the hello and one response per request.
    let hello = ClientMessage::decode(&server.recv().await?)?;
    assert_eq!(
        hello,
        ClientMessage::NameAndColor {
            color: Rgb::new(10, 20, 30),
            name: "tester".into()
        }
    );
    for _ in 0..2 {
        let reply = ClientMessage::decode(&server.recv().await?)?;
        assert_eq!(reply, ClientMessage::MoveResponse(Move::Right));
    }
    assert_client_hung_up(&mut server).await;

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            Event::GameStart {
                rows: 10,
                cols: 10,
                id: 1
            },
            Event::Square {
                pos: Pos::new(2, 3),
                old: Cell::Empty,
                new: Cell::Snake(1)
            },
            Event::Square {
                pos: Pos::new(5, 5),
                old: Cell::Empty,
                new: Cell::Food
            },
            Event::Select {
                turn: 1,
                head: Pos::new(2, 3)
            },
            Event::Square {
                pos: Pos::new(2, 3),
                old: Cell::Snake(1),
                new: Cell::Empty
            },
            Event::Square {
                pos: Pos::new(2, 4),
                old: Cell::Empty,
                new: Cell::Snake(1)
            },
            Event::Mismatch(GridMismatch {
                pos: Pos::new(7, 7),
                local: Cell::Empty,
                remote: Cell::Food
            }),
            Event::Select {
                turn: 2,
                head: Pos::new(2, 4)
            },
            Event::Death("ran into a wall".into()),
            Event::Results(results()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn game_changes_fire_square_notifications() -> anyhow::Result<()> {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(10, 10, 1),
            ServerMessage::GameChanges(GameChanges {
                head: Pos::new(4, 5),
                turn: 1,
                updates: vec![update(2, 3, Cell::Empty), update(4, 5, Cell::Snake(7))],
            }),
            ServerMessage::GameResults(results()),
        ],
    )
    .await;

    let (player, events) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    session.run().await?;

    let game = session.game().unwrap();
    assert_eq!(game.board().get(2, 3)?, Cell::Empty);
    assert_eq!(game.board().get(4, 5)?, Cell::Snake(7));

    let squares: Vec<Event> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, Event::Square { .. }))
        .cloned()
        .collect();
    assert_eq!(
        squares,
        vec![
            Event::Square {
                pos: Pos::new(2, 3),
                old: Cell::Empty,
                new: Cell::Empty
            },
            Event::Square {
                pos: Pos::new(4, 5),
                old: Cell::Empty,
                new: Cell::Snake(7)
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn game_start_allocates_board_once() -> anyhow::Result<()> {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(10, 10, 1),
            ServerMessage::GameResults(results()),
        ],
    )
    .await;

    let (player, events) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    session.run().await?;

    let game = session.game().unwrap();
    assert_eq!(game.board().dims(), (10, 10));
    assert!(game.board().iter().all(|(_, c)| c == Cell::Empty));
    let starts = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, Event::GameStart { .. }))
        .count();
    assert_eq!(starts, 1);
    Ok(())
}

#[tokio::test]
async fn handshake_rejects_other_first_packet() {
    let (mut server, client) = InMemoryTransport::pair();
    script(&mut server, &[start(10, 10, 1)]).await;

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Handshake(HandshakeError::UnexpectedPacket(3))
    ));
    assert_eq!(session.state(), SessionState::Terminated(Termination::Errored));
    assert_client_hung_up(&mut server).await;
}

#[tokio::test]
async fn handshake_fails_when_server_goes_away() {
    let (server, client) = InMemoryTransport::pair();
    drop(server);

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Handshake(HandshakeError::Framing(_))
    ));
}

#[tokio::test]
async fn unknown_packet_type_is_fatal() {
    let (mut server, client) = InMemoryTransport::pair();
    script(&mut server, &[ServerMessage::ConnectionEstablished]).await;
    server
        .send(snake_client::Packet::empty(9))
        .await
        .unwrap();

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::UnknownPacketType(9))
    ));
    assert_client_hung_up(&mut server).await;
}

#[tokio::test]
async fn out_of_bounds_update_is_fatal() {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(4, 4, 1),
            ServerMessage::GameChanges(GameChanges {
                head: Pos::new(0, 0),
                turn: 1,
                updates: vec![update(4, 0, Cell::Food)],
            }),
        ],
    )
    .await;

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    match err {
        SessionError::Protocol(ProtocolError::Board(BoardError::OutOfBounds { pos, .. })) => {
            assert_eq!(pos, Pos::new(4, 0));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_client_hung_up(&mut server).await;
}

#[tokio::test]
async fn changes_before_game_start_rejected() {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            ServerMessage::GameChanges(GameChanges {
                head: Pos::new(0, 0),
                turn: 1,
                updates: vec![],
            }),
        ],
    )
    .await;

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Unexpected {
            kind: "GameChanges",
            ..
        })
    ));
}

#[tokio::test]
async fn second_game_start_rejected() {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(4, 4, 1),
            start(8, 8, 1),
        ],
    )
    .await;

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Unexpected {
            kind: "GameStart",
            ..
        })
    ));
    assert_eq!(session.game().unwrap().board().dims(), (4, 4));
}

#[tokio::test]
async fn move_request_after_death_rejected() {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[
            ServerMessage::ConnectionEstablished,
            start(4, 4, 1),
            ServerMessage::SnakeDeath("starved".into()),
            ServerMessage::MoveRequest,
        ],
    )
    .await;

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Unexpected {
            kind: "MoveRequest",
            state: "dead"
        })
    ));
}

#[tokio::test]
async fn stream_closed_mid_game_is_framing_error() {
    let (mut server, client) = InMemoryTransport::pair();
    script(
        &mut server,
        &[ServerMessage::ConnectionEstablished, start(4, 4, 1)],
    )
    .await;
    // Accept the hello, then hang up.
    let hangup = tokio::spawn(async move {
        server.recv().await.unwrap();
    });

    let (player, _) = Recorder::new(Move::Up);
    let mut session = Session::new(identity(), Box::new(player), Box::new(client));
    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Framing(FrameError::Closed { .. })
    ));
    hangup.await.unwrap();
}
