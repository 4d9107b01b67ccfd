use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

use chuck_common::protocol::{
    self, framed_transport, serialize_message, ClientMessage, ServerMessage, Transport,
};

use crate::handler;
use crate::server::SharedState;

/// Frames a client may fall behind by before it is dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

pub struct ConnectionHandle {
    pub player_name: String,
    pub tx: mpsc::Sender<ServerMessage>,
    writer: AbortHandle,
}

impl ConnectionHandle {
    pub fn new(player_name: String, tx: mpsc::Sender<ServerMessage>, writer: AbortHandle) -> Self {
        Self {
            player_name,
            tx,
            writer,
        }
    }

    /// Stop the writer task. The reader side notices and runs the usual
    /// disconnect cleanup.
    pub fn close(&self) {
        self.writer.abort();
    }
}

/// Wait for `hello` and answer with `welcome`. `None` means the peer went
/// away or sent something else first.
async fn handshake(transport: &mut Transport) -> anyhow::Result<Option<(Uuid, String)>> {
    let hello: ClientMessage = match protocol::recv_message(transport).await? {
        Some(msg) => msg,
        None => return Ok(None),
    };

    let ClientMessage::Hello { username, version } = hello else {
        protocol::send_message(
            transport,
            &ServerMessage::HandshakeError {
                reason: "Expected hello message".into(),
            },
        )
        .await?;
        return Ok(None);
    };

    tracing::info!("Player '{}' connected (client version: {})", username, version);
    let player_id = Uuid::new_v4();
    protocol::send_message(
        transport,
        &ServerMessage::Welcome {
            player_id,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
    .await?;
    Ok(Some((player_id, username)))
}

pub async fn handle_connection(stream: TcpStream, state: SharedState) -> anyhow::Result<()> {
    let mut transport = framed_transport(stream);
    let Some((player_id, player_name)) = handshake(&mut transport).await? else {
        return Ok(());
    };

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);
    let (mut sink, mut frames) = transport.split();

    let mut writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serialize_message(&msg) {
                Ok(bytes) => {
                    if sink.send(bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to serialize message: {}", e),
            }
        }
    });

    state.connections.write().await.insert(
        player_id,
        ConnectionHandle::new(player_name.clone(), tx, writer.abort_handle()),
    );

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(frame)) => match protocol::deserialize_message::<ClientMessage>(&frame) {
                    Ok(msg) => handler::handle_message(player_id, msg, &state).await,
                    Err(e) => tracing::warn!("Failed to parse message from {}: {}", player_name, e),
                },
                Some(Err(e)) => {
                    tracing::warn!("Read error from {}: {}", player_name, e);
                    break;
                }
                None => {
                    tracing::info!("Player '{}' disconnected", player_name);
                    break;
                }
            },
            _ = &mut writer => {
                tracing::info!("Outbound stream to '{}' closed", player_name);
                break;
            }
        }
    }

    handler::handle_disconnect(player_id, &state).await;
    writer.abort();
    Ok(())
}
