use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{GameConfig, DEFAULT_ROUNDS, MAX_ROUNDS};
use crate::player::Player;
use crate::scoring::{self, ScoreDelta};

pub const MIN_PLAYERS: usize = 2;

// -- Match Mode --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeKind {
    Points,
    Rounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// First alive player to the points target wins.
    Points,
    /// The match ends after this many rounds.
    Rounds(u32),
}

impl MatchMode {
    pub fn from_request(kind: ModeKind, rounds: Option<u32>) -> Self {
        match kind {
            ModeKind::Points => MatchMode::Points,
            ModeKind::Rounds => {
                MatchMode::Rounds(rounds.unwrap_or(DEFAULT_ROUNDS).clamp(1, MAX_ROUNDS))
            }
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            MatchMode::Points => ModeKind::Points,
            MatchMode::Rounds(_) => ModeKind::Rounds,
        }
    }

    pub fn rounds(&self) -> Option<u32> {
        match self {
            MatchMode::Points => None,
            MatchMode::Rounds(n) => Some(*n),
        }
    }
}

// -- Room Phase State Machine --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Lobby,
    ChuckTurn,
    Answering,
    Resolving,
    Finished,
}

impl GamePhase {
    pub fn in_match(&self) -> bool {
        matches!(
            self,
            GamePhase::ChuckTurn | GamePhase::Answering | GamePhase::Resolving
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
    pub round: u32,
    pub chuck_id: Uuid,
    pub chuck_name: String,
}

#[derive(Debug, Clone)]
pub struct RoundResolution {
    pub round: u32,
    pub answers: HashMap<Uuid, String>,
    pub deltas: HashMap<Uuid, ScoreDelta>,
    pub players: Vec<Player>,
    pub winner: Option<Player>,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Continue,
    Winner(Uuid),
    NoWinner,
}

/// What the room has to do after a member left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    Nothing,
    ChuckRedrawn(RoundStart),
    AllAnswered,
    MatchOver { winner: Option<Player> },
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub mode: Option<MatchMode>,
    pub round: u32,
    pub chuck_id: Option<Uuid>,
    pub current_word: Option<String>,
    pub answers: HashMap<Uuid, String>,
    /// Set when a round starts resolving, cleared when the next one starts.
    pub resolving: bool,
    pub config: GameConfig,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            phase: GamePhase::Lobby,
            players: Vec::new(),
            mode: None,
            round: 0,
            chuck_id: None,
            current_word: None,
            answers: HashMap::new(),
            resolving: false,
            config,
        }
    }

    // -- Membership --

    pub fn add_player(&mut self, id: Uuid, username: &str) -> Result<&Player, GameError> {
        if self.player(id).is_some() {
            return Err(GameError::AlreadyInRoom);
        }
        self.players
            .push(Player::new(id, username, self.config.starting_lives));
        Ok(&self.players[self.players.len() - 1])
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_name(&self, id: Uuid) -> String {
        self.player(id)
            .map(|p| p.username.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    pub fn is_chuck(&self, id: Uuid) -> bool {
        self.chuck_id == Some(id)
    }

    /// Remove a member and repair the round around the gap it leaves.
    pub fn remove_player(
        &mut self,
        id: Uuid,
        rng: &mut impl Rng,
    ) -> Option<(Player, Departure)> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let player = self.players.remove(index);
        self.answers.remove(&id);

        if !self.phase.in_match() {
            return Some((player, Departure::Nothing));
        }

        if self.alive_players().count() <= 1 {
            let winner = self.alive_players().next().cloned();
            self.finish();
            return Some((player, Departure::MatchOver { winner }));
        }

        let phase = self.phase;
        let departure = match phase {
            GamePhase::ChuckTurn if self.is_chuck(id) => match self.draw_chuck(rng) {
                Ok(start) => Departure::ChuckRedrawn(start),
                Err(_) => Departure::Nothing,
            },
            GamePhase::Answering if self.all_answered() => Departure::AllAnswered,
            _ => Departure::Nothing,
        };
        Some((player, departure))
    }

    // -- Round Flow --

    /// `lobby -> chuckTurn`.
    pub fn start(&mut self, mode: MatchMode, rng: &mut impl Rng) -> Result<RoundStart, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::WrongPhase(self.phase));
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        self.mode = Some(mode);
        self.round = 0;
        self.begin_round(rng)
    }

    /// `resolving -> chuckTurn`, once the inter-round delay has passed.
    pub fn next_round(&mut self, rng: &mut impl Rng) -> Result<RoundStart, GameError> {
        if self.phase != GamePhase::Resolving {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.begin_round(rng)
    }

    fn begin_round(&mut self, rng: &mut impl Rng) -> Result<RoundStart, GameError> {
        self.resolving = false;
        self.answers.clear();
        self.current_word = None;
        self.round += 1;
        self.draw_chuck(rng)
    }

    fn draw_chuck(&mut self, rng: &mut impl Rng) -> Result<RoundStart, GameError> {
        let (chuck_id, chuck_name) = {
            let alive: Vec<&Player> = self.alive_players().collect();
            let chuck = alive.choose(rng).ok_or(GameError::NoAlivePlayers)?;
            (chuck.id, chuck.username.clone())
        };
        self.chuck_id = Some(chuck_id);
        self.phase = GamePhase::ChuckTurn;
        Ok(RoundStart {
            round: self.round,
            chuck_id,
            chuck_name,
        })
    }

    /// `chuckTurn -> answering`. Returns the normalized word.
    pub fn submit_word(&mut self, player_id: Uuid, word: &str) -> Result<String, GameError> {
        if self.phase != GamePhase::ChuckTurn {
            return Err(GameError::WrongPhase(self.phase));
        }
        if !self.is_chuck(player_id) {
            return Err(GameError::NotChuck);
        }
        let word = normalize(word).ok_or(GameError::EmptyWord)?;
        self.current_word = Some(word.clone());
        self.phase = GamePhase::Answering;
        Ok(word)
    }

    /// Record an answer. Returns true once every alive non-Chuck player
    /// has answered.
    pub fn submit_answer(&mut self, player_id: Uuid, answer: &str) -> Result<bool, GameError> {
        if self.phase != GamePhase::Answering {
            return Err(GameError::WrongPhase(self.phase));
        }
        let player = self.player(player_id).ok_or(GameError::UnknownPlayer)?;
        if !player.is_alive() {
            return Err(GameError::PlayerEliminated);
        }
        let answer = normalize(answer).ok_or(GameError::EmptyAnswer)?;
        self.answers.insert(player_id, answer);
        Ok(self.all_answered())
    }

    pub fn all_answered(&self) -> bool {
        self.alive_players()
            .filter(|p| !self.is_chuck(p.id))
            .all(|p| self.answers.contains_key(&p.id))
    }

    /// `answering -> resolving`, then `finished` if the match is decided.
    ///
    /// Only the first call per round does anything; later calls fail with
    /// [`GameError::AlreadyResolving`].
    pub fn resolve_round(&mut self) -> Result<RoundResolution, GameError> {
        if self.resolving {
            return Err(GameError::AlreadyResolving);
        }
        if self.phase != GamePhase::Answering {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.resolving = true;
        self.phase = GamePhase::Resolving;
        self.current_word = None;

        let answers = std::mem::take(&mut self.answers);
        let deltas = scoring::score_round(&answers, self.chuck_id);
        for player in &mut self.players {
            if let Some(delta) = deltas.get(&player.id) {
                player.add_points(delta.points);
                if delta.life_lost {
                    player.lose_life();
                }
            }
        }

        let result = self.match_result();
        let winner = match &result {
            MatchResult::Winner(id) => self.player(*id).cloned(),
            _ => None,
        };
        let game_over = result != MatchResult::Continue;
        if game_over {
            self.finish();
        }

        Ok(RoundResolution {
            round: self.round,
            answers,
            deltas,
            players: self.players.clone(),
            winner,
            game_over,
        })
    }

    /// Decide whether the match is over after a round's mutation.
    pub fn match_result(&self) -> MatchResult {
        let alive: Vec<&Player> = self.alive_players().collect();
        match alive.len() {
            0 => return MatchResult::NoWinner,
            1 => return MatchResult::Winner(alive[0].id),
            _ => {}
        }

        let leader = top_scorer(&alive);
        if let Some(leader) = leader {
            if leader.score >= self.config.points_target {
                return MatchResult::Winner(leader.id);
            }
        }

        if let Some(MatchMode::Rounds(total)) = self.mode {
            if self.round >= total {
                return match leader {
                    Some(leader)
                        if alive.iter().filter(|p| p.score == leader.score).count() == 1 =>
                    {
                        MatchResult::Winner(leader.id)
                    }
                    _ => MatchResult::NoWinner,
                };
            }
        }

        MatchResult::Continue
    }

    fn finish(&mut self) {
        self.phase = GamePhase::Finished;
        self.current_word = None;
        self.answers.clear();
    }
}

/// Highest score wins; ties go to whoever joined first.
fn top_scorer<'a>(players: &[&'a Player]) -> Option<&'a Player> {
    players.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.score >= p.score => Some(b),
        _ => Some(p),
    })
}

fn normalize(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_uppercase())
    }
}

// -- Errors --

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("action not allowed during {0:?}")]
    WrongPhase(GamePhase),
    #[error("only the Chuck can submit the word")]
    NotChuck,
    #[error("not enough players (need at least 2)")]
    NotEnoughPlayers,
    #[error("word is empty")]
    EmptyWord,
    #[error("answer is empty")]
    EmptyAnswer,
    #[error("player is not in this room")]
    UnknownPlayer,
    #[error("player is already in this room")]
    AlreadyInRoom,
    #[error("eliminated players cannot answer")]
    PlayerEliminated,
    #[error("round is already resolving")]
    AlreadyResolving,
    #[error("no alive players left")]
    NoAlivePlayers,
}
