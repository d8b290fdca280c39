use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::dao::models::{GameSettingsEntity, GameStateEntity, PhaseKey};

/// Clients render a synchronized 3-2-1 countdown before a trivia timer
/// visibly starts, so the persisted anchor sits this far in the future.
pub const COUNTDOWN_OFFSET: Duration = Duration::from_millis(3000);

/// Typed form of a room's game state.
///
/// Each variant carries only the fields meaningful to its phase; the flat
/// persisted record ([`GameStateEntity`]) is derived from it and parsed back
/// through [`GamePhase::from_entity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for players to join; scores and ledgers untouched until start.
    Lobby,
    /// A trivia question is open for answers.
    Trivia {
        /// 1-based round counter.
        round: u32,
        /// 1-based question counter within the round.
        question: u32,
        /// Wall-clock anchor the question timer counts from (already offset
        /// by [`COUNTDOWN_OFFSET`]).
        question_starts_at: SystemTime,
    },
    /// The correct choice is revealed; no score changes happen here.
    TriviaReview {
        /// 1-based round counter.
        round: u32,
        /// 1-based question counter within the round.
        question: u32,
    },
    /// The scavenger challenge is open for submissions.
    Scavenger {
        /// 1-based round counter.
        round: u32,
        /// 1-based question counter within the round.
        question: u32,
        /// Wall-clock anchor the scavenger timer counts from.
        scavenger_started_at: SystemTime,
    },
    /// Host moderates scavenger submissions.
    Review {
        /// 1-based round counter.
        round: u32,
        /// 1-based question counter within the round.
        question: u32,
    },
    /// End-of-round standings.
    RoundSummary {
        /// The round that just completed.
        round: u32,
    },
    /// Final standings; only an explicit restart leaves this state.
    Finished,
    /// Reserved status: no transition enters or leaves it.
    Paused,
}

/// Events a host-authenticated caller can apply to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Explicit "start game" action from the lobby.
    StartGame,
    /// Advance to whatever comes next in the current phase.
    Advance,
    /// Reset a finished game back to the lobby.
    Restart,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from}")]
pub struct InvalidTransition {
    /// Phase tag the room was in when the event arrived.
    pub from: PhaseKey,
    /// The rejected event.
    pub event: GameEvent,
}

/// Error returned when a persisted state record cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupt game state record: {reason} (status {status})")]
pub struct CorruptGameState {
    /// Persisted phase tag.
    pub status: PhaseKey,
    /// What was wrong with the record.
    pub reason: &'static str,
}

/// Side effects that must accompany a transition before the state write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionEffects {
    /// Reset every player's points and clear both submission ledgers.
    pub reset_progress: bool,
}

/// A validated transition: the phase it was computed from (the CAS key), the
/// phase to write, and the side effects to run first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Tag of the phase the plan was computed against. A conditional state
    /// write keyed on this tag rejects the plan if another writer got there
    /// first, so two racing advances can never skip a phase.
    pub expected: PhaseKey,
    /// Phase to enter.
    pub next: GamePhase,
    /// Accompanying side effects.
    pub effects: TransitionEffects,
}

impl GamePhase {
    /// Tag identifying this phase.
    pub fn key(&self) -> PhaseKey {
        match self {
            GamePhase::Lobby => PhaseKey::Lobby,
            GamePhase::Trivia { .. } => PhaseKey::Trivia,
            GamePhase::TriviaReview { .. } => PhaseKey::TriviaReview,
            GamePhase::Scavenger { .. } => PhaseKey::Scavenger,
            GamePhase::Review { .. } => PhaseKey::Review,
            GamePhase::RoundSummary { .. } => PhaseKey::RoundSummary,
            GamePhase::Finished => PhaseKey::Finished,
            GamePhase::Paused => PhaseKey::Paused,
        }
    }

    /// Parse the flat persisted record into the typed form.
    pub fn from_entity(entity: &GameStateEntity) -> Result<Self, CorruptGameState> {
        let corrupt = |reason| CorruptGameState {
            status: entity.status,
            reason,
        };
        let counters = || {
            if entity.current_round == 0 || entity.current_question == 0 {
                Err(corrupt(
                    "zero round/question counter in a round-scoped phase",
                ))
            } else {
                Ok((entity.current_round, entity.current_question))
            }
        };

        match entity.status {
            PhaseKey::Lobby => Ok(GamePhase::Lobby),
            PhaseKey::Finished => Ok(GamePhase::Finished),
            PhaseKey::Paused => Ok(GamePhase::Paused),
            PhaseKey::Trivia => {
                let (round, question) = counters()?;
                let question_starts_at = entity
                    .question_start_time
                    .ok_or_else(|| corrupt("trivia phase without a question anchor"))?;
                Ok(GamePhase::Trivia {
                    round,
                    question,
                    question_starts_at,
                })
            }
            PhaseKey::TriviaReview => {
                let (round, question) = counters()?;
                Ok(GamePhase::TriviaReview { round, question })
            }
            PhaseKey::Scavenger => {
                let (round, question) = counters()?;
                let scavenger_started_at = entity
                    .scavenger_start_time
                    .ok_or_else(|| corrupt("scavenger phase without a challenge anchor"))?;
                Ok(GamePhase::Scavenger {
                    round,
                    question,
                    scavenger_started_at,
                })
            }
            PhaseKey::Review => {
                let (round, question) = counters()?;
                Ok(GamePhase::Review { round, question })
            }
            PhaseKey::RoundSummary => {
                if entity.current_round == 0 {
                    Err(corrupt("zero round counter in round summary"))
                } else {
                    Ok(GamePhase::RoundSummary {
                        round: entity.current_round,
                    })
                }
            }
        }
    }

    /// Flatten the typed form into the persisted record.
    pub fn to_entity(&self) -> GameStateEntity {
        match self {
            GamePhase::Lobby | GamePhase::Finished | GamePhase::Paused => GameStateEntity {
                status: self.key(),
                ..GameStateEntity::lobby()
            },
            GamePhase::Trivia {
                round,
                question,
                question_starts_at,
            } => GameStateEntity {
                status: PhaseKey::Trivia,
                current_round: *round,
                current_question: *question,
                question_start_time: Some(*question_starts_at),
                scavenger_start_time: None,
            },
            GamePhase::TriviaReview { round, question } => GameStateEntity {
                status: PhaseKey::TriviaReview,
                current_round: *round,
                current_question: *question,
                question_start_time: None,
                scavenger_start_time: None,
            },
            GamePhase::Scavenger {
                round,
                question,
                scavenger_started_at,
            } => GameStateEntity {
                status: PhaseKey::Scavenger,
                current_round: *round,
                current_question: *question,
                question_start_time: None,
                scavenger_start_time: Some(*scavenger_started_at),
            },
            GamePhase::Review { round, question } => GameStateEntity {
                status: PhaseKey::Review,
                current_round: *round,
                current_question: *question,
                question_start_time: None,
                scavenger_start_time: None,
            },
            GamePhase::RoundSummary { round } => GameStateEntity {
                status: PhaseKey::RoundSummary,
                current_round: *round,
                current_question: 0,
                question_start_time: None,
                scavenger_start_time: None,
            },
        }
    }

    /// Round/question counters when the phase is question-scoped.
    pub fn current_question(&self) -> Option<(u32, u32)> {
        match self {
            GamePhase::Trivia {
                round, question, ..
            }
            | GamePhase::TriviaReview { round, question }
            | GamePhase::Scavenger {
                round, question, ..
            }
            | GamePhase::Review { round, question } => Some((*round, *question)),
            _ => None,
        }
    }

    /// When the trivia timer runs out, if one is running.
    pub fn trivia_deadline(&self, settings: &GameSettingsEntity) -> Option<SystemTime> {
        match self {
            GamePhase::Trivia {
                question_starts_at, ..
            } => Some(*question_starts_at + Duration::from_secs(settings.time_per_trivia_question)),
            _ => None,
        }
    }

    /// When the scavenger timer runs out, if one is running.
    pub fn scavenger_deadline(&self, settings: &GameSettingsEntity) -> Option<SystemTime> {
        match self {
            GamePhase::Scavenger {
                scavenger_started_at,
                ..
            } => Some(*scavenger_started_at + Duration::from_secs(settings.time_per_scavenger)),
            _ => None,
        }
    }

    /// When the current trivia question became current (anchor minus the
    /// countdown offset); used to enforce the minimum dwell before advances.
    pub fn question_loaded_at(&self) -> Option<SystemTime> {
        match self {
            GamePhase::Trivia {
                question_starts_at, ..
            } => Some(*question_starts_at - COUNTDOWN_OFFSET),
            _ => None,
        }
    }
}

/// Compute the transition an event produces from the current phase.
///
/// Pure: performs no I/O and mutates nothing. Callers are responsible for
/// the host-key guard, for running the returned side effects, and for
/// committing `next` through a conditional write keyed on `expected`.
pub fn plan_transition(
    current: &GamePhase,
    event: GameEvent,
    settings: &GameSettingsEntity,
    now: SystemTime,
) -> Result<Transition, InvalidTransition> {
    let expected = current.key();
    let fresh_question = |round, question| GamePhase::Trivia {
        round,
        question,
        question_starts_at: now + COUNTDOWN_OFFSET,
    };

    let (next, effects) = match (current, event) {
        (GamePhase::Lobby, GameEvent::StartGame) => (
            fresh_question(1, 1),
            TransitionEffects {
                reset_progress: true,
            },
        ),
        (
            GamePhase::Trivia {
                round, question, ..
            },
            GameEvent::Advance,
        ) => (
            GamePhase::TriviaReview {
                round: *round,
                question: *question,
            },
            TransitionEffects::default(),
        ),
        (GamePhase::TriviaReview { round, question }, GameEvent::Advance) => (
            GamePhase::Scavenger {
                round: *round,
                question: *question,
                scavenger_started_at: now,
            },
            TransitionEffects::default(),
        ),
        (
            GamePhase::Scavenger {
                round, question, ..
            },
            GameEvent::Advance,
        ) => (
            GamePhase::Review {
                round: *round,
                question: *question,
            },
            TransitionEffects::default(),
        ),
        (GamePhase::Review { round, question }, GameEvent::Advance) => {
            let next = if *question < settings.questions_per_round {
                fresh_question(*round, *question + 1)
            } else if *round < settings.number_of_rounds {
                GamePhase::RoundSummary { round: *round }
            } else {
                GamePhase::Finished
            };
            (next, TransitionEffects::default())
        }
        (GamePhase::RoundSummary { round }, GameEvent::Advance) => {
            (fresh_question(*round + 1, 1), TransitionEffects::default())
        }
        (GamePhase::Finished, GameEvent::Restart) => (
            GamePhase::Lobby,
            TransitionEffects {
                reset_progress: true,
            },
        ),
        (_, event) => {
            return Err(InvalidTransition {
                from: expected,
                event,
            });
        }
    };

    Ok(Transition {
        expected,
        next,
        effects,
    })
}
