//! Pure point-award computations for both game modes.

/// A correct answer never earns less than this share of the base points,
/// however late it arrives within the time limit.
const MIN_TRIVIA_RATIO: f64 = 0.5;

/// Points for a trivia answer.
///
/// Incorrect answers earn zero regardless of timing. With time scaling off a
/// correct answer earns exactly `base_points`. With scaling on, the award
/// falls linearly from `base_points` at instant answers down to half the
/// base at (or beyond) the limit, rounded to the nearest integer.
pub fn trivia_points(
    is_correct: bool,
    base_points: u32,
    time_limit_secs: u64,
    elapsed_ms: u64,
    time_scaling: bool,
) -> u32 {
    if !is_correct {
        return 0;
    }
    if !time_scaling {
        return base_points;
    }

    let limit_ms = time_limit_secs.saturating_mul(1000);
    let time_ratio = if limit_ms == 0 {
        1.0
    } else {
        (elapsed_ms as f64 / limit_ms as f64).clamp(0.0, 1.0)
    };
    let scaled_ratio = MIN_TRIVIA_RATIO + (1.0 - MIN_TRIVIA_RATIO) * (1.0 - time_ratio);

    (f64::from(base_points) * scaled_ratio).round() as u32
}

/// Points for a scavenger submission given the host's verdict.
///
/// `is_first_approved` is decided at approval time by checking whether any
/// other submission for the question already holds an approval. It is not
/// the arrival order: an early submitter that gets rejected leaves the
/// first-approved award to whoever is approved next.
pub fn scavenger_points(
    approved: Option<bool>,
    is_first_approved: bool,
    first_points: u32,
    other_points: u32,
    rejected_points: u32,
) -> u32 {
    match approved {
        None => 0,
        Some(false) => rejected_points,
        Some(true) if is_first_approved => first_points,
        Some(true) => other_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_answers_earn_nothing() {
        for elapsed in [0, 5_000, 30_000, 90_000] {
            assert_eq!(trivia_points(false, 100, 30, elapsed, true), 0);
            assert_eq!(trivia_points(false, 100, 30, elapsed, false), 0);
        }
    }

    #[test]
    fn unscaled_correct_answers_earn_the_base() {
        for elapsed in [0, 15_000, 30_000, 60_000] {
            assert_eq!(trivia_points(true, 100, 30, elapsed, false), 100);
        }
    }

    #[test]
    fn scaled_answers_hit_the_documented_anchors() {
        assert_eq!(trivia_points(true, 100, 30, 0, true), 100);
        assert_eq!(trivia_points(true, 100, 30, 15_000, true), 75);
        assert_eq!(trivia_points(true, 100, 30, 30_000, true), 50);
        // Beyond the limit the award floors at half the base.
        assert_eq!(trivia_points(true, 100, 30, 45_000, true), 50);
    }

    #[test]
    fn scaled_awards_stay_in_range_and_decrease_with_time() {
        let mut previous = u32::MAX;
        for elapsed in (0..=40_000).step_by(500) {
            let points = trivia_points(true, 100, 30, elapsed, true);
            assert!((50..=100).contains(&points), "{points} out of range");
            assert!(points <= previous, "award increased at {elapsed}ms");
            previous = points;
        }
    }

    #[test]
    fn odd_bases_round_to_nearest() {
        // 75 * 0.5 = 37.5 rounds up at the deadline.
        assert_eq!(trivia_points(true, 75, 30, 30_000, true), 38);
        assert_eq!(trivia_points(true, 75, 30, 0, true), 75);
    }

    #[test]
    fn scavenger_tiers_follow_the_verdict() {
        assert_eq!(scavenger_points(None, false, 10, 5, 2), 0);
        assert_eq!(scavenger_points(None, true, 10, 5, 2), 0);
        assert_eq!(scavenger_points(Some(false), false, 10, 5, 2), 2);
        assert_eq!(scavenger_points(Some(true), true, 10, 5, 2), 10);
        assert_eq!(scavenger_points(Some(true), false, 10, 5, 2), 5);
    }
}
