//! Mapping from a player rating to engine strength settings.
//!
//! Lower ratings get a weaker engine dial, a shallower search and a larger pool
//! of acceptable replies to draw imperfect moves from. Higher ratings get an
//! engine that plays close to its objective best line.

use serde::{Deserialize, Serialize};
use uci::SearchLimit;

/// Supported rating buckets, ascending.
pub const BUCKETS: [u32; 5] = [400, 800, 1200, 1600, 2000];

/// Search budget for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Time budget per move in milliseconds.
    pub movetime_ms: u64,
    /// Depth ceiling; takes precedence over the time budget when set.
    pub depth: Option<u32>,
}

impl SearchBudget {
    /// The limit actually sent with `go`.
    pub fn limit(&self) -> SearchLimit {
        SearchLimit::prefer_depth(self.depth, self.movetime_ms)
    }
}

/// Engine configuration derived from a rating bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Engine's `Skill Level` option, 0..=20.
    pub strength_level: u8,
    /// Search budget per move.
    pub budget: SearchBudget,
    /// Number of lines requested from the engine (`MultiPV`).
    pub candidate_pool: u32,
    /// Number of top lines eligible for weighted reply selection.
    pub replay_pool: u32,
}

/// Snap a rating to the nearest bucket.
///
/// Any integer is accepted. When a rating sits exactly between two buckets
/// (600, 1000, ...) the lower bucket wins.
pub fn clamp_to_bucket(rating: i32) -> u32 {
    let rating = i64::from(rating);
    BUCKETS
        .iter()
        .copied()
        .min_by_key(|&b| (i64::from(b) - rating).abs())
        .unwrap_or(BUCKETS[0])
}

/// Look up the profile for a bucket.
pub fn resolve_profile(bucket: u32) -> DifficultyProfile {
    let (strength_level, movetime_ms, depth, candidate_pool, replay_pool) = match bucket {
        b if b <= 400 => (2, 50, 6, 3, 3),
        b if b <= 800 => (6, 100, 8, 3, 2),
        b if b <= 1200 => (10, 150, 10, 3, 2),
        b if b <= 1600 => (14, 250, 12, 3, 1),
        _ => (18, 400, 14, 3, 1),
    };

    DifficultyProfile {
        strength_level,
        budget: SearchBudget {
            movetime_ms,
            depth: Some(depth),
        },
        candidate_pool,
        replay_pool,
    }
}

/// Clamp a rating and resolve its profile in one step.
pub fn profile_for_rating(rating: i32) -> DifficultyProfile {
    resolve_profile(clamp_to_bucket(rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamp_rounds_to_nearest() {
        assert_eq!(clamp_to_bucket(50), 400);
        assert_eq!(clamp_to_bucket(700), 800);
        assert_eq!(clamp_to_bucket(1300), 1200);
        assert_eq!(clamp_to_bucket(1700), 1600);
    }

    #[test]
    fn clamp_handles_out_of_range() {
        assert_eq!(clamp_to_bucket(i32::MIN), 400);
        assert_eq!(clamp_to_bucket(-5), 400);
        assert_eq!(clamp_to_bucket(3200), 2000);
        assert_eq!(clamp_to_bucket(i32::MAX), 2000);
    }

    #[test]
    fn clamp_ties_go_to_lower_bucket() {
        assert_eq!(clamp_to_bucket(600), 400);
        assert_eq!(clamp_to_bucket(1000), 800);
        assert_eq!(clamp_to_bucket(1400), 1200);
        assert_eq!(clamp_to_bucket(1800), 1600);
        assert_eq!(clamp_to_bucket(601), 800);
    }

    #[test]
    fn beginner_profile() {
        let p = resolve_profile(400);
        assert_eq!(p.strength_level, 2);
        assert_eq!(p.budget.movetime_ms, 50);
        assert_eq!(p.budget.limit(), SearchLimit::Depth(6));
        assert_eq!(p.candidate_pool, 3);
        assert_eq!(p.replay_pool, 3);
    }

    #[test]
    fn strongest_profile() {
        let p = profile_for_rating(2800);
        assert_eq!(p.strength_level, 18);
        assert_eq!(p.budget.movetime_ms, 400);
        assert_eq!(p.budget.depth, Some(14));
        assert_eq!(p.replay_pool, 1);
    }

    #[test]
    fn profiles_are_monotonic() {
        for pair in BUCKETS.windows(2) {
            let lo = resolve_profile(pair[0]);
            let hi = resolve_profile(pair[1]);
            assert!(lo.strength_level <= hi.strength_level);
            assert!(lo.budget.movetime_ms <= hi.budget.movetime_ms);
            assert!(lo.budget.depth <= hi.budget.depth);
            assert!(lo.replay_pool >= hi.replay_pool);
        }
    }

    #[test]
    fn profiles_respect_pool_invariants() {
        for bucket in BUCKETS {
            let p = resolve_profile(bucket);
            assert!(p.replay_pool >= 1);
            assert!(p.replay_pool <= p.candidate_pool);
            assert!(p.strength_level <= 20);
        }
    }

    proptest! {
        #[test]
        fn clamp_is_idempotent_and_lands_on_a_bucket(rating in any::<i32>()) {
            let bucket = clamp_to_bucket(rating);
            prop_assert!(BUCKETS.contains(&bucket));
            prop_assert_eq!(clamp_to_bucket(bucket as i32), bucket);
        }
    }
}
