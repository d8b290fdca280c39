//! Auto-advance coordinator.
//!
//! One instance runs per attached host stream. It polls aggregate
//! participation counts and the wall-clock timers every couple of seconds,
//! and triggers the same advance operation a manual host click would issue.
//! A local single-flight guard (with a cooldown that outlives the response,
//! to absorb propagation delay of the resulting state change) keeps
//! overlapping ticks from double-firing; the conditional state write in the
//! game service is the actual correctness backstop against other devices.

use std::time::{Duration, Instant, SystemTime};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    dao::models::GameSettingsEntity,
    error::ServiceError,
    services::{game_service, presence_service, sse_events},
    state::{
        SharedState,
        state_machine::{COUNTDOWN_OFFSET, GamePhase},
    },
};

/// Cadence of the submission-count / timer checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// The advance lock releases this long after a transition completes, not on
/// response receipt, so the coordinator's own view catches up first.
pub const ADVANCE_COOLDOWN: Duration = Duration::from_millis(3000);

/// No advance of any kind is permitted within this long of a trivia
/// question being loaded, so slow clients get to see it.
pub const MIN_QUESTION_DWELL: Duration = Duration::from_millis(5000);

/// What the coordinator decided on one poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Trigger the advance operation.
    Advance(AdvanceReason),
    /// Withhold an automatic advance and defer to manual host action.
    Waiting(&'static str),
    /// Nothing to do this tick.
    Hold,
}

/// Why an automatic advance fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    /// Every connected player answered the trivia question.
    AllAnswered,
    /// The trivia timer ran out with at least one answer on record.
    TriviaTimerExpired,
    /// Every connected player submitted scavenger proof.
    AllSubmitted,
    /// The scavenger timer ran out (completion is optional by design).
    ScavengerTimerExpired,
}

/// Aggregate counts for the current question. `None` means the count check
/// failed this tick; the decision function treats that as "not everyone is
/// in yet" before the deadline and favors advancing after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseCounts {
    /// Trivia answers on record.
    pub answered: Option<usize>,
    /// Scavenger submissions on record.
    pub submitted: Option<usize>,
}

/// Decide whether this tick should advance the room.
///
/// Pure so the policy is testable without clocks or storage: the caller
/// supplies `now` along with everything it polled.
pub fn evaluate(
    phase: &GamePhase,
    settings: &GameSettingsEntity,
    counts: &PhaseCounts,
    connected_players: usize,
    now: SystemTime,
) -> Decision {
    match phase {
        GamePhase::Trivia {
            question_starts_at, ..
        } => {
            // Dwell first: even a full house waits until slow clients have
            // had a chance to render the question.
            let loaded_at = *question_starts_at - COUNTDOWN_OFFSET;
            if now < loaded_at + MIN_QUESTION_DWELL {
                return Decision::Hold;
            }

            if all_accounted_for(counts.answered, connected_players) {
                return Decision::Advance(AdvanceReason::AllAnswered);
            }

            let deadline =
                *question_starts_at + Duration::from_secs(settings.time_per_trivia_question);
            if now >= deadline {
                return match counts.answered {
                    // Nobody answered (everyone momentarily disconnected?):
                    // surface a waiting signal instead of racing ahead.
                    Some(0) => Decision::Waiting(
                        "the timer expired with no answers; waiting for a manual advance",
                    ),
                    // Count known and nonzero, or the check failed at the
                    // expiry juncture: advance rather than wedge the game.
                    _ => Decision::Advance(AdvanceReason::TriviaTimerExpired),
                };
            }

            Decision::Hold
        }
        GamePhase::Scavenger {
            scavenger_started_at,
            ..
        } => {
            if all_accounted_for(counts.submitted, connected_players) {
                return Decision::Advance(AdvanceReason::AllSubmitted);
            }

            let deadline =
                *scavenger_started_at + Duration::from_secs(settings.time_per_scavenger);
            if now >= deadline {
                // Scavenger completion is optional; expiry always advances.
                return Decision::Advance(AdvanceReason::ScavengerTimerExpired);
            }

            Decision::Hold
        }
        // Review and summary phases advance manually; everything else has
        // no timers to watch.
        _ => Decision::Hold,
    }
}

fn all_accounted_for(count: Option<usize>, connected_players: usize) -> bool {
    connected_players > 0 && count.is_some_and(|n| n >= connected_players)
}

/// Single-flight advance guard: suppresses further attempts while one is
/// outstanding and for [`ADVANCE_COOLDOWN`] after it completes.
#[derive(Debug, Default)]
pub struct AdvanceGuard {
    in_flight: bool,
    cooldown_until: Option<Instant>,
}

impl AdvanceGuard {
    /// Try to claim the guard for an advance attempt.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        if self.cooldown_until.is_some_and(|until| now < until) {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Mark the in-flight advance finished and start the cooldown.
    pub fn finish(&mut self, now: Instant) {
        self.in_flight = false;
        self.cooldown_until = Some(now + ADVANCE_COOLDOWN);
    }
}

/// Poll loop bound to one attached host stream. Aborted when the stream
/// drops; errors are logged and the next tick retries.
///
/// Also carries the host's liveness pings while the stream is attached, so
/// players never see a "host disconnected" posture from a healthy host.
pub async fn run(state: SharedState, room_code: String, host_key: String) {
    let mut guard = AdvanceGuard::default();
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping = tokio::time::interval(presence_service::HOST_PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(room_code = %room_code, "auto-advance coordinator attached");
    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Err(err) = tick(&state, &room_code, &host_key, &mut guard).await {
                    debug!(room_code = %room_code, error = %err, "auto-advance tick skipped");
                }
            }
            _ = ping.tick() => {
                // Presence pings are best-effort telemetry; failures stay quiet.
                if let Err(err) = presence_service::host_ping(&state, &room_code, &host_key).await {
                    debug!(room_code = %room_code, error = %err, "host presence ping failed");
                }
            }
        }
    }
}

async fn tick(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
    guard: &mut AdvanceGuard,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let Some(room) = store.find_room_by_code(room_code.to_string()).await? else {
        return Err(ServiceError::NotFound(format!(
            "room `{room_code}` no longer exists"
        )));
    };

    let phase = GamePhase::from_entity(&room.game_state)?;
    let Some((round, question_number)) = phase.current_question() else {
        return Ok(());
    };
    let Some(question) = store.find_question(room.id, round, question_number).await? else {
        return Ok(());
    };

    let connected_players = store
        .list_players(room.id)
        .await?
        .iter()
        .filter(|player| player.connected)
        .count();

    let counts = PhaseCounts {
        answered: match store.count_submissions(question.id).await {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(room_code, error = %err, "answer count check failed");
                None
            }
        },
        submitted: match store.count_scavengers(question.id).await {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(room_code, error = %err, "scavenger count check failed");
                None
            }
        },
    };

    match evaluate(
        &phase,
        &room.settings,
        &counts,
        connected_players,
        SystemTime::now(),
    ) {
        Decision::Hold => {}
        Decision::Waiting(reason) => {
            sse_events::broadcast_host_waiting(state, room_code, reason);
        }
        Decision::Advance(reason) => {
            if !guard.try_begin(Instant::now()) {
                return Ok(());
            }
            info!(room_code, ?reason, "auto-advancing");
            match game_service::advance(state, room_code, host_key).await {
                Ok(_) => {}
                // Another device (or a manual click) got there first; the
                // conditional write did its job.
                Err(ServiceError::Conflict(message)) => {
                    debug!(room_code, message = %message, "auto-advance lost the race");
                }
                Err(err) => {
                    warn!(room_code, error = %err, "auto-advance failed");
                }
            }
            guard.finish(Instant::now());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GameSettingsEntity {
        GameSettingsEntity::default()
    }

    fn trivia_anchored(anchor: SystemTime) -> GamePhase {
        GamePhase::Trivia {
            round: 1,
            question: 1,
            question_starts_at: anchor,
        }
    }

    fn scavenger_anchored(anchor: SystemTime) -> GamePhase {
        GamePhase::Scavenger {
            round: 1,
            question: 1,
            scavenger_started_at: anchor,
        }
    }

    fn counts(answered: Option<usize>, submitted: Option<usize>) -> PhaseCounts {
        PhaseCounts {
            answered,
            submitted,
        }
    }

    #[test]
    fn all_answered_advances_after_the_dwell() {
        let anchor = SystemTime::now();
        let phase = trivia_anchored(anchor);
        let in_dwell = anchor - COUNTDOWN_OFFSET + Duration::from_millis(4000);
        let past_dwell = anchor - COUNTDOWN_OFFSET + Duration::from_millis(5500);

        assert_eq!(
            evaluate(&phase, &settings(), &counts(Some(4), None), 4, in_dwell),
            Decision::Hold
        );
        assert_eq!(
            evaluate(&phase, &settings(), &counts(Some(4), None), 4, past_dwell),
            Decision::Advance(AdvanceReason::AllAnswered)
        );
    }

    #[test]
    fn partial_answers_hold_until_the_deadline() {
        let anchor = SystemTime::now();
        let phase = trivia_anchored(anchor);
        let mid_question = anchor + Duration::from_secs(10);
        assert_eq!(
            evaluate(&phase, &settings(), &counts(Some(2), None), 4, mid_question),
            Decision::Hold
        );
    }

    #[test]
    fn expiry_with_answers_advances_but_empty_room_waits() {
        let anchor = SystemTime::now();
        let phase = trivia_anchored(anchor);
        let expired = anchor + Duration::from_secs(31);

        assert_eq!(
            evaluate(&phase, &settings(), &counts(Some(1), None), 4, expired),
            Decision::Advance(AdvanceReason::TriviaTimerExpired)
        );
        assert!(matches!(
            evaluate(&phase, &settings(), &counts(Some(0), None), 4, expired),
            Decision::Waiting(_)
        ));
    }

    #[test]
    fn count_failure_is_conservative_before_expiry_and_permissive_after() {
        let anchor = SystemTime::now();
        let phase = trivia_anchored(anchor);

        let mid_question = anchor + Duration::from_secs(10);
        assert_eq!(
            evaluate(&phase, &settings(), &counts(None, None), 4, mid_question),
            Decision::Hold
        );

        let expired = anchor + Duration::from_secs(31);
        assert_eq!(
            evaluate(&phase, &settings(), &counts(None, None), 4, expired),
            Decision::Advance(AdvanceReason::TriviaTimerExpired)
        );
    }

    #[test]
    fn scavenger_expiry_always_advances() {
        let anchor = SystemTime::now();
        let phase = scavenger_anchored(anchor);
        let expired = anchor + Duration::from_secs(61);

        assert_eq!(
            evaluate(&phase, &settings(), &counts(None, Some(0)), 4, expired),
            Decision::Advance(AdvanceReason::ScavengerTimerExpired)
        );
        assert_eq!(
            evaluate(&phase, &settings(), &counts(None, None), 4, expired),
            Decision::Advance(AdvanceReason::ScavengerTimerExpired)
        );
    }

    #[test]
    fn scavenger_full_participation_advances_early() {
        let anchor = SystemTime::now();
        let phase = scavenger_anchored(anchor);
        let mid_challenge = anchor + Duration::from_secs(5);
        assert_eq!(
            evaluate(&phase, &settings(), &counts(None, Some(3)), 3, mid_challenge),
            Decision::Advance(AdvanceReason::AllSubmitted)
        );
    }

    #[test]
    fn zero_connected_players_never_triggers_full_participation() {
        let anchor = SystemTime::now();
        let phase = trivia_anchored(anchor);
        let mid_question = anchor + Duration::from_secs(10);
        assert_eq!(
            evaluate(&phase, &settings(), &counts(Some(0), None), 0, mid_question),
            Decision::Hold
        );
    }

    #[test]
    fn manual_phases_are_left_alone() {
        let now = SystemTime::now();
        for phase in [
            GamePhase::Lobby,
            GamePhase::TriviaReview {
                round: 1,
                question: 1,
            },
            GamePhase::Review {
                round: 1,
                question: 1,
            },
            GamePhase::RoundSummary { round: 1 },
            GamePhase::Finished,
        ] {
            assert_eq!(
                evaluate(&phase, &settings(), &counts(Some(9), Some(9)), 1, now),
                Decision::Hold,
                "{phase:?} should hold"
            );
        }
    }

    #[test]
    fn guard_is_single_flight_with_cooldown() {
        let mut guard = AdvanceGuard::default();
        let start = Instant::now();

        assert!(guard.try_begin(start));
        // Overlapping tick while the first advance is outstanding.
        assert!(!guard.try_begin(start + Duration::from_millis(100)));

        guard.finish(start + Duration::from_millis(200));
        // Still cooling down: the resulting state change needs time to
        // propagate back into the coordinator's view.
        assert!(!guard.try_begin(start + Duration::from_millis(1200)));
        // Cooldown over.
        assert!(guard.try_begin(start + Duration::from_millis(3300)));
    }
}
