//! In-process clients for driving the handlers without sockets.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use chuck_common::game::{GamePhase, ModeKind};
use chuck_common::protocol::{ClientMessage, ServerMessage};
use chuck_common::room_code::RoomCode;

use crate::connection::{ConnectionHandle, OUTBOUND_CAPACITY};
use crate::handler::handle_message;
use crate::server::SharedState;

pub struct TestClient {
    pub id: Uuid,
    pub rx: mpsc::Receiver<ServerMessage>,
    /// Stands in for the socket writer; finishes only when aborted.
    pub writer: JoinHandle<()>,
}

impl TestClient {
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }
}

pub async fn connect(state: &SharedState, name: &str) -> TestClient {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer = tokio::spawn(std::future::pending::<()>());
    state.connections.write().await.insert(
        id,
        ConnectionHandle::new(name.to_string(), tx, writer.abort_handle()),
    );
    TestClient { id, rx, writer }
}

/// A room with `names.len()` members; the first one hosts.
pub async fn room_with(state: &SharedState, names: &[&str]) -> (RoomCode, Vec<TestClient>) {
    let mut clients = Vec::new();
    for name in names {
        clients.push(connect(state, name).await);
    }
    handle_message(clients[0].id, ClientMessage::CreateRoom(names[0].into()), state).await;
    let code = state
        .lobby
        .read()
        .await
        .players
        .lookup_room(clients[0].id)
        .cloned()
        .unwrap();
    for (client, name) in clients.iter().zip(names).skip(1) {
        let join = ClientMessage::JoinRoom {
            room_code: code.to_string(),
            username: name.to_string(),
        };
        handle_message(client.id, join, state).await;
    }
    for client in &mut clients {
        client.drain();
    }
    (code, clients)
}

pub fn new_round(msgs: &[ServerMessage]) -> Option<(u32, Uuid)> {
    msgs.iter().find_map(|m| match m {
        ServerMessage::NewRound {
            round, chuck_id, ..
        } => Some((*round, *chuck_id)),
        _ => None,
    })
}

pub fn count_results(msgs: &[ServerMessage]) -> usize {
    msgs.iter()
        .filter(|m| matches!(m, ServerMessage::RoundResults { .. }))
        .count()
}

/// Start a points match and return the first Chuck.
pub async fn start(state: &SharedState, clients: &mut [TestClient]) -> Uuid {
    let start = ClientMessage::StartGame {
        mode: ModeKind::Points,
        rounds: None,
    };
    handle_message(clients[0].id, start, state).await;
    let msgs = clients[0].drain();
    for client in clients.iter_mut().skip(1) {
        client.drain();
    }
    new_round(&msgs).map(|(_, chuck)| chuck).unwrap()
}

pub async fn phase_of(state: &SharedState, code: &RoomCode) -> Option<GamePhase> {
    state
        .lobby
        .read()
        .await
        .rooms
        .get_room(code)
        .map(|r| r.game.phase)
}
