use rand::Rng;
use tokio::task::JoinHandle;
use uuid::Uuid;

use chuck_common::config::GameConfig;
use chuck_common::game::{Departure, GameState};
use chuck_common::player::Player;
use chuck_common::protocol::ServerMessage;
use chuck_common::room_code::RoomCode;

pub struct Room {
    pub code: RoomCode,
    pub host_id: Uuid,
    pub game: GameState,
    /// The one outstanding timer, if any.
    pub timer: Option<JoinHandle<()>>,
    /// Bumped on every schedule and cancel; a timer carrying an older
    /// token is stale.
    pub timer_token: u64,
}

impl Room {
    pub fn new(code: RoomCode, host_id: Uuid, host_name: &str, config: GameConfig) -> Self {
        let mut game = GameState::new(config);
        game.players
            .push(Player::new(host_id, host_name, config.starting_lives));
        Self {
            code,
            host_id,
            game,
            timer: None,
            timer_token: 0,
        }
    }

    pub fn is_host(&self, player_id: Uuid) -> bool {
        self.host_id == player_id
    }

    pub fn is_empty(&self) -> bool {
        self.game.players.is_empty()
    }

    /// Remove a member, handing the host role to the earliest remaining
    /// joiner if needed.
    pub fn remove_player(&mut self, player_id: Uuid, rng: &mut impl Rng) -> Option<Departure> {
        let (_, departure) = self.game.remove_player(player_id, rng)?;

        if self.host_id == player_id {
            if let Some(new_host) = self.game.players.first() {
                tracing::info!(
                    "Room {}: host passed to '{}'",
                    self.code,
                    new_host.username
                );
                self.host_id = new_host.id;
            }
        }
        Some(departure)
    }

    pub fn cancel_timer(&mut self) {
        self.timer_token += 1;
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    /// Get all member IDs for broadcasting.
    pub fn member_ids(&self) -> Vec<Uuid> {
        self.game.players.iter().map(|p| p.id).collect()
    }

    pub fn players_updated(&self) -> ServerMessage {
        ServerMessage::PlayersUpdated(self.game.players.clone())
    }
}
