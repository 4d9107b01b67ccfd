use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NAME: &str = "Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    Alive,
    Eliminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub username: String,
    pub score: u32,
    pub lives: u8,
    pub status: PlayerStatus,
}

impl Player {
    pub fn new(id: Uuid, username: &str, lives: u8) -> Self {
        let username = username.trim();
        Self {
            id,
            username: if username.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                username.to_string()
            },
            score: 0,
            lives,
            status: if lives == 0 {
                PlayerStatus::Eliminated
            } else {
                PlayerStatus::Alive
            },
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    pub fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Take one life away. Returns true if this call eliminated the player.
    pub fn lose_life(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = PlayerStatus::Eliminated;
            return true;
        }
        false
    }
}
