use std::collections::HashMap;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use uuid::Uuid;

use crate::game::{GamePhase, ModeKind};
use crate::player::Player;
use crate::room_code::RoomCode;

// -- Framing --

pub const MAX_FRAME_LENGTH: usize = 64 * 1024;

pub type Transport = Framed<TcpStream, LengthDelimitedCodec>;

pub fn framed_transport(stream: TcpStream) -> Transport {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_framed(stream)
}

// -- Client -> Server Messages --

/// Every frame is `{"event": <name>, "payload": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    // Handshake
    Hello {
        username: String,
        version: String,
    },

    // Rooms
    CreateRoom(String),
    JoinRoom {
        room_code: String,
        username: String,
    },
    LeaveRoom,

    // Gameplay
    StartGame {
        mode: ModeKind,
        #[serde(default)]
        rounds: Option<u32>,
    },
    SubmitWord(String),
    SubmitAnswer(String),

    // Connection
    Ping,
}

// -- Server -> Client Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // Handshake
    Welcome {
        player_id: Uuid,
        server_version: String,
    },
    HandshakeError {
        reason: String,
    },

    // Rooms
    RoomCreated {
        room_code: RoomCode,
        is_host: bool,
    },
    JoinedRoom {
        room_code: RoomCode,
        is_host: bool,
    },
    RoomLeft,
    PlayersUpdated(Vec<Player>),
    GameStateUpdated(GameStatus),

    // Rounds
    GameStarted {
        mode: ModeKind,
        rounds: Option<u32>,
    },
    NewRound {
        round: u32,
        chuck: String,
        chuck_id: Uuid,
    },
    YourTurnAsChuck,
    WordRevealed {
        word: String,
        chuck: String,
    },
    RoundResults {
        answers: HashMap<Uuid, String>,
        scores: Vec<Player>,
        winner: Option<Player>,
        game_over: bool,
    },
    GameFinished {
        winner: Option<Player>,
    },

    // Errors
    Error(String),

    // Connection
    Pong,
}

/// Value carried by `gameStateUpdated`. `Playing` is announced once when a
/// match starts, the rest mirror [`GamePhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Lobby,
    Playing,
    ChuckTurn,
    Answering,
    Resolving,
    Finished,
}

impl From<GamePhase> for GameStatus {
    fn from(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Lobby => GameStatus::Lobby,
            GamePhase::ChuckTurn => GameStatus::ChuckTurn,
            GamePhase::Answering => GameStatus::Answering,
            GamePhase::Resolving => GameStatus::Resolving,
            GamePhase::Finished => GameStatus::Finished,
        }
    }
}

// -- Serialization helpers --

pub fn serialize_message<T: Serialize>(msg: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_vec(msg)?;
    Ok(Bytes::from(json))
}

pub fn deserialize_message<T: for<'de> Deserialize<'de>>(
    data: &[u8],
) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}

// -- Transport helpers --

pub async fn send_message<T: Serialize>(
    transport: &mut Transport,
    msg: &T,
) -> anyhow::Result<()> {
    let bytes = serialize_message(msg).map_err(|e| anyhow::anyhow!("serialize error: {}", e))?;
    transport
        .send(bytes)
        .await
        .map_err(|e| anyhow::anyhow!("send error: {}", e))
}

pub async fn recv_message<T: for<'de> Deserialize<'de>>(
    transport: &mut Transport,
) -> anyhow::Result<Option<T>> {
    match transport.next().await {
        Some(Ok(frame)) => {
            let msg = deserialize_message(&frame)
                .map_err(|e| anyhow::anyhow!("deserialize error: {}", e))?;
            Ok(Some(msg))
        }
        Some(Err(e)) => Err(anyhow::anyhow!("recv error: {}", e)),
        None => Ok(None),
    }
}
