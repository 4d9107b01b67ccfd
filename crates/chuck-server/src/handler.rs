//! Inbound event handlers.
//!
//! Rejected actions (wrong phase, not the host, not the Chuck) are dropped
//! without a reply; only an unknown room code is reported back.

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use chuck_common::game::{GameError, MatchMode};
use chuck_common::protocol::{ClientMessage, ServerMessage};
use chuck_common::room_code::RoomCode;

use crate::outbox::Outbox;
use crate::registry::Lobby;
use crate::scheduler;
use crate::server::SharedState;

pub const ROOM_NOT_FOUND: &str = "Room not found";

pub async fn handle_message(player_id: Uuid, msg: ClientMessage, state: &SharedState) {
    let fallback_name = handshake_name(player_id, state).await;
    let mut outbox = Outbox::new();

    let mut lobby = state.lobby.write().await;
    apply(player_id, msg, &fallback_name, &mut lobby, state, &mut outbox);
    outbox.deliver(state).await;
}

pub async fn handle_disconnect(player_id: Uuid, state: &SharedState) {
    {
        let mut outbox = Outbox::new();
        let mut lobby = state.lobby.write().await;
        leave_room(player_id, &mut lobby, state, &mut outbox);
        outbox.deliver(state).await;
    }
    state.connections.write().await.remove(&player_id);
}

fn apply(
    player_id: Uuid,
    msg: ClientMessage,
    fallback_name: &str,
    lobby: &mut Lobby,
    state: &SharedState,
    outbox: &mut Outbox,
) {
    match msg {
        ClientMessage::Hello { .. } => {
            tracing::debug!("Ignoring repeated hello from {}", player_id);
        }

        ClientMessage::CreateRoom(username) => {
            let name = display_name(&username, fallback_name);
            leave_room(player_id, lobby, state, outbox);

            let mut rng = StdRng::from_entropy();
            let code = lobby
                .rooms
                .create_room(player_id, &name, state.config, &mut rng);
            lobby.players.register(player_id, code.clone());
            tracing::info!("Room {} created by '{}'", code, name);

            if let Some(room) = lobby.rooms.get_room(&code) {
                outbox.to_player(
                    player_id,
                    ServerMessage::RoomCreated {
                        room_code: code.clone(),
                        is_host: true,
                    },
                );
                outbox.to_room(room, room.players_updated());
            }
        }

        ClientMessage::JoinRoom {
            room_code,
            username,
        } => {
            let name = display_name(&username, fallback_name);
            let code = match RoomCode::parse(&room_code) {
                Ok(c) if lobby.rooms.get_room(&c).is_some() => c,
                _ => {
                    tracing::debug!("Join for unknown room '{}'", room_code);
                    outbox.to_player(player_id, ServerMessage::Error(ROOM_NOT_FOUND.into()));
                    return;
                }
            };

            if lobby.players.lookup_room(player_id) != Some(&code) {
                leave_room(player_id, lobby, state, outbox);
            }

            let Some(room) = lobby.rooms.get_room_mut(&code) else {
                return;
            };
            if let Err(e) = room.game.add_player(player_id, &name) {
                ignore(player_id, "joinRoom", &e);
            } else {
                tracing::info!("'{}' joined room {}", name, code);
            }
            let is_host = room.is_host(player_id);
            outbox.to_player(
                player_id,
                ServerMessage::JoinedRoom {
                    room_code: code.clone(),
                    is_host,
                },
            );
            outbox.to_room(room, room.players_updated());
            outbox.to_room(room, ServerMessage::GameStateUpdated(room.game.phase.into()));
            lobby.players.register(player_id, code);
        }

        ClientMessage::LeaveRoom => {
            leave_room(player_id, lobby, state, outbox);
            outbox.to_player(player_id, ServerMessage::RoomLeft);
        }

        ClientMessage::StartGame { mode, rounds } => {
            let Some(room) = lobby.room_of_mut(player_id) else {
                return;
            };
            if !room.is_host(player_id) {
                tracing::debug!("Non-host {} tried to start room {}", player_id, room.code);
                return;
            }

            let mode = MatchMode::from_request(mode, rounds);
            if let Err(e) = scheduler::start_match(room, mode, outbox) {
                ignore(player_id, "startGame", &e);
            }
        }

        ClientMessage::SubmitWord(word) => {
            let Some(room) = lobby.room_of_mut(player_id) else {
                return;
            };
            if let Err(e) = scheduler::reveal_word(state, room, player_id, &word, outbox) {
                ignore(player_id, "submitWord", &e);
            }
        }

        ClientMessage::SubmitAnswer(answer) => {
            let Some(room) = lobby.room_of_mut(player_id) else {
                return;
            };
            if let Err(e) = scheduler::record_answer(state, room, player_id, &answer, outbox) {
                ignore(player_id, "submitAnswer", &e);
            }
        }

        ClientMessage::Ping => {
            outbox.to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Take a player out of whatever room they are in, tearing the room down
/// when it empties.
fn leave_room(player_id: Uuid, lobby: &mut Lobby, state: &SharedState, outbox: &mut Outbox) {
    let Some(code) = lobby.players.unregister(player_id) else {
        return;
    };
    let Some(room) = lobby.rooms.get_room_mut(&code) else {
        return;
    };

    let mut rng = StdRng::from_entropy();
    let departure = room.remove_player(player_id, &mut rng);

    if room.is_empty() {
        lobby.rooms.destroy_room(&code);
        tracing::info!("Room {} closed ({} still open)", code, lobby.rooms.len());
        return;
    }

    outbox.to_room(room, room.players_updated());
    if let Some(departure) = departure {
        scheduler::handle_departure(state, room, departure, outbox);
    }
}

async fn handshake_name(player_id: Uuid, state: &SharedState) -> String {
    state
        .connections
        .read()
        .await
        .get(&player_id)
        .map(|c| c.player_name.clone())
        .unwrap_or_default()
}

/// The name from the request, or the handshake name when it is blank.
fn display_name(requested: &str, fallback: &str) -> String {
    match requested.trim() {
        "" => fallback.to_string(),
        name => name.to_string(),
    }
}

fn ignore(player_id: Uuid, action: &str, e: &GameError) {
    tracing::debug!("Ignored {} from {}: {}", action, player_id, e);
}
