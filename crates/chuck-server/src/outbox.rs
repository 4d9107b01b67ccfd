use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use chuck_common::protocol::ServerMessage;

use crate::room::Room;
use crate::server::SharedState;

/// Messages queued during a transition.
///
/// Callers deliver while still holding the lobby lock, so every room sees
/// its transitions in the order they happened. Delivery never waits on a
/// client: a full queue gets that connection dropped instead.
#[derive(Debug, Default)]
pub struct Outbox {
    envelopes: Vec<(Vec<Uuid>, ServerMessage)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_player(&mut self, player_id: Uuid, msg: ServerMessage) {
        self.envelopes.push((vec![player_id], msg));
    }

    pub fn to_room(&mut self, room: &Room, msg: ServerMessage) {
        self.envelopes.push((room.member_ids(), msg));
    }

    pub async fn deliver(self, state: &SharedState) {
        let mut stalled = Vec::new();
        {
            let conns = state.connections.read().await;
            for (recipients, msg) in self.envelopes {
                for id in recipients {
                    let Some(conn) = conns.get(&id) else {
                        continue;
                    };
                    match conn.tx.try_send(msg.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            if !stalled.contains(&id) {
                                stalled.push(id);
                            }
                        }
                        // Writer already gone; its reader will clean up.
                        Err(TrySendError::Closed(_)) => {}
                    }
                }
            }
        }

        if stalled.is_empty() {
            return;
        }
        let mut conns = state.connections.write().await;
        for id in stalled {
            if let Some(conn) = conns.remove(&id) {
                tracing::warn!(
                    "Dropping '{}' ({}): outbound queue full",
                    conn.player_name,
                    id
                );
                conn.close();
            }
        }
    }
}
