//! Round scheduling: phase transitions that broadcast, and the single
//! timer each room may have outstanding.
//!
//! Every function here runs with the lobby write lock held, so transitions
//! on one room never interleave. Timer tasks take the same lock before
//! touching the room and funnel into the same functions as player events.
//! A timer that lost the race to a player event finds its token outdated
//! and does nothing.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use chuck_common::game::{Departure, GameError, MatchMode, RoundStart};
use chuck_common::player::Player;
use chuck_common::protocol::{GameStatus, ServerMessage};
use chuck_common::room_code::RoomCode;

use crate::outbox::Outbox;
use crate::room::Room;
use crate::server::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Closes the answer window and forces resolution.
    AnswerWindow,
    /// Starts the next round after the results pause.
    NextRound,
}

impl TimerKind {
    fn delay(&self, state: &SharedState) -> Duration {
        match self {
            TimerKind::AnswerWindow => state.config.answer_window,
            TimerKind::NextRound => state.config.next_round_delay,
        }
    }
}

/// Replace the room's timer with a new one.
pub fn schedule(state: &SharedState, room: &mut Room, kind: TimerKind) {
    room.cancel_timer();
    let token = room.timer_token;
    let delay = kind.delay(state);
    let code = room.code.clone();
    let task_state = state.clone();

    tracing::debug!("Room {}: {:?} timer set for {:?}", code, kind, delay);
    room.timer = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        fire(&task_state, &code, token, kind).await;
    }));
}

async fn fire(state: &SharedState, code: &RoomCode, token: u64, kind: TimerKind) {
    let mut outbox = Outbox::new();
    let mut lobby = state.lobby.write().await;
    let Some(room) = lobby.rooms.get_room_mut(code) else {
        return;
    };
    if room.timer_token != token {
        tracing::debug!("Room {}: stale {:?} timer ignored", code, kind);
        return;
    }
    // This task is the handle; detach it rather than abort ourselves.
    room.timer = None;

    tracing::debug!("Room {}: {:?} timer fired", code, kind);
    match kind {
        TimerKind::AnswerWindow => resolve(state, room, &mut outbox),
        TimerKind::NextRound => {
            let mut rng = StdRng::from_entropy();
            match room.game.next_round(&mut rng) {
                Ok(start) => announce_round(room, &start, &mut outbox),
                Err(e) => tracing::debug!("Room {}: next round skipped: {}", code, e),
            }
        }
    }
    outbox.deliver(state).await;
}

/// `lobby -> chuckTurn`, on the host's request.
pub fn start_match(
    room: &mut Room,
    mode: MatchMode,
    outbox: &mut Outbox,
) -> Result<(), GameError> {
    let mut rng = StdRng::from_entropy();
    let start = room.game.start(mode, &mut rng)?;
    tracing::info!(
        "Room {}: match started ({:?}, {} players)",
        room.code,
        mode,
        room.game.players.len()
    );

    outbox.to_room(
        room,
        ServerMessage::GameStarted {
            mode: mode.kind(),
            rounds: mode.rounds(),
        },
    );
    outbox.to_room(room, ServerMessage::GameStateUpdated(GameStatus::Playing));
    announce_round(room, &start, outbox);
    Ok(())
}

fn announce_round(room: &Room, start: &RoundStart, outbox: &mut Outbox) {
    tracing::debug!(
        "Room {}: round {} with '{}' as Chuck",
        room.code,
        start.round,
        start.chuck_name
    );
    outbox.to_room(
        room,
        ServerMessage::NewRound {
            round: start.round,
            chuck: start.chuck_name.clone(),
            chuck_id: start.chuck_id,
        },
    );
    outbox.to_player(start.chuck_id, ServerMessage::YourTurnAsChuck);
}

/// `chuckTurn -> answering`, and open the answer window.
pub fn reveal_word(
    state: &SharedState,
    room: &mut Room,
    player_id: Uuid,
    word: &str,
    outbox: &mut Outbox,
) -> Result<(), GameError> {
    let word = room.game.submit_word(player_id, word)?;
    outbox.to_room(
        room,
        ServerMessage::WordRevealed {
            word,
            chuck: room.game.player_name(player_id),
        },
    );
    outbox.to_room(room, ServerMessage::GameStateUpdated(GameStatus::Answering));
    schedule(state, room, TimerKind::AnswerWindow);
    Ok(())
}

/// Store an answer and resolve early once nobody is left to wait for.
pub fn record_answer(
    state: &SharedState,
    room: &mut Room,
    player_id: Uuid,
    answer: &str,
    outbox: &mut Outbox,
) -> Result<(), GameError> {
    if room.game.submit_answer(player_id, answer)? {
        resolve(state, room, outbox);
    }
    Ok(())
}

/// `answering -> resolving`: score, broadcast, then either queue the next
/// round or finish. A second trigger for the same round is a no-op.
pub fn resolve(state: &SharedState, room: &mut Room, outbox: &mut Outbox) {
    let resolution = match room.game.resolve_round() {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Room {}: resolution skipped: {}", room.code, e);
            return;
        }
    };
    room.cancel_timer();

    outbox.to_room(
        room,
        ServerMessage::RoundResults {
            answers: resolution.answers,
            scores: resolution.players,
            winner: resolution.winner.clone(),
            game_over: resolution.game_over,
        },
    );

    if resolution.game_over {
        finish(room, resolution.winner, outbox);
    } else {
        schedule(state, room, TimerKind::NextRound);
    }
}

/// Repair the round after a member left.
pub fn handle_departure(
    state: &SharedState,
    room: &mut Room,
    departure: Departure,
    outbox: &mut Outbox,
) {
    match departure {
        Departure::Nothing => {}
        Departure::ChuckRedrawn(start) => announce_round(room, &start, outbox),
        Departure::AllAnswered => resolve(state, room, outbox),
        Departure::MatchOver { winner } => {
            room.cancel_timer();
            finish(room, winner, outbox);
        }
    }
}

fn finish(room: &Room, winner: Option<Player>, outbox: &mut Outbox) {
    match &winner {
        Some(w) => tracing::info!("Room {}: '{}' wins", room.code, w.username),
        None => tracing::info!("Room {}: match over with no winner", room.code),
    }
    outbox.to_room(room, ServerMessage::GameFinished { winner });
}
