use std::time::Duration;

pub const DEFAULT_ANSWER_WINDOW_SECS: u64 = 20;
pub const DEFAULT_NEXT_ROUND_DELAY_SECS: u64 = 5;
pub const DEFAULT_POINTS_TARGET: u32 = 20;
pub const DEFAULT_STARTING_LIVES: u8 = 5;

pub const DEFAULT_ROUNDS: u32 = 10;
pub const MAX_ROUNDS: u32 = 50;

/// Gameplay tunables shared by every room on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub answer_window: Duration,
    pub next_round_delay: Duration,
    pub points_target: u32,
    pub starting_lives: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            answer_window: Duration::from_secs(DEFAULT_ANSWER_WINDOW_SECS),
            next_round_delay: Duration::from_secs(DEFAULT_NEXT_ROUND_DELAY_SECS),
            points_target: DEFAULT_POINTS_TARGET,
            starting_lives: DEFAULT_STARTING_LIVES,
        }
    }
}
