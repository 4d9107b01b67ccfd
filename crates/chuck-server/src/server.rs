use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

use chuck_common::config::GameConfig;

use crate::connection::{self, ConnectionHandle};
use crate::registry::Lobby;

/// Everything the handlers share. Lock order is `lobby` before
/// `connections`.
pub struct ServerState {
    pub lobby: RwLock<Lobby>,
    pub connections: RwLock<HashMap<Uuid, ConnectionHandle>>,
    pub max_connections: usize,
    pub config: GameConfig,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(max_connections: usize, config: GameConfig) -> SharedState {
        Arc::new(ServerState {
            lobby: RwLock::new(Lobby::new()),
            connections: RwLock::new(HashMap::new()),
            max_connections,
            config,
        })
    }
}

pub async fn run(addr: SocketAddr, max_connections: usize, config: GameConfig) -> anyhow::Result<()> {
    let state = ServerState::new(max_connections, config);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;

        let open = state.connections.read().await.len();
        if open >= state.max_connections {
            tracing::warn!("Turning away {}: {} connections open", peer_addr, open);
            continue;
        }
        tracing::info!("Accepted {} ({}/{})", peer_addr, open + 1, state.max_connections);

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = connection::handle_connection(stream, state).await {
                tracing::warn!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}
