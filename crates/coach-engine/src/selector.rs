//! Weighted reply selection that imitates a player of a given strength.
//!
//! Candidate `i` (0 = best) gets weight `max(0.05, 0.7 / (i + 1))` before
//! normalization, so for three candidates the draw is 6/11, 3/11 and 2/11.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uci::EngineLine;

/// Floor applied to every candidate's raw weight.
pub const MIN_WEIGHT: f64 = 0.05;
/// Raw weight of the best candidate.
pub const TOP_WEIGHT: f64 = 0.7;

/// Normalized selection weights for `n` candidates, best first.
pub fn candidate_weights(n: usize) -> Vec<f64> {
    let raw: Vec<f64> = (0..n)
        .map(|i| (TOP_WEIGHT / (i + 1) as f64).max(MIN_WEIGHT))
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Picks the reply actually played from the analyzed candidates.
#[derive(Debug, Clone)]
pub struct MoveSelector<R = StdRng> {
    rng: R,
}

impl MoveSelector<StdRng> {
    /// Selector seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Selector with a fixed seed, for reproducible play.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MoveSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Choose a reply among the first `replay_pool` lines.
    ///
    /// Falls back to `best_move` when the pool is 1 or fewer than two lines
    /// have a usable first move.
    pub fn select(
        &mut self,
        lines: &[EngineLine],
        best_move: Option<&str>,
        replay_pool: u32,
    ) -> Option<String> {
        let fallback = best_move.map(str::to_string);
        if replay_pool <= 1 {
            return fallback;
        }

        let candidates: Vec<&str> = lines
            .iter()
            .filter_map(EngineLine::first_move)
            .take(replay_pool as usize)
            .collect();
        if candidates.len() < 2 {
            return fallback;
        }

        let weights = candidate_weights(candidates.len());
        let dist = match WeightedIndex::new(&weights) {
            Ok(dist) => dist,
            Err(e) => {
                tracing::warn!(error = %e, "invalid selection weights, keeping engine move");
                return fallback;
            }
        };

        let picked = candidates[dist.sample(&mut self.rng)];
        tracing::debug!(
            picked,
            best = best_move.unwrap_or("-"),
            pool = candidates.len(),
            "selected reply"
        );
        Some(picked.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uci::InfoBuilder;

    fn lines(moves: &[&str]) -> Vec<EngineLine> {
        moves
            .iter()
            .enumerate()
            .map(|(i, mv)| {
                InfoBuilder::new()
                    .rank(i as u32 + 1)
                    .depth(10)
                    .score_cp(50 - 20 * i as i32)
                    .pv([*mv, "e7e5"])
                    .build()
            })
            .collect()
    }

    #[test]
    fn weights_match_formula() {
        let w = candidate_weights(3);
        assert_eq!(w.len(), 3);
        assert!((w[0] - 0.545).abs() < 0.001);
        assert!((w[1] - 0.273).abs() < 0.001);
        assert!((w[2] - 0.182).abs() < 0.001);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weights_hit_floor_for_deep_pools() {
        let w = candidate_weights(20);
        // From the 14th candidate on, 0.7 / (i + 1) <= 0.05 and the floor applies.
        assert!((w[13] - w[14]).abs() < 1e-12);
        assert!((w[18] - w[19]).abs() < 1e-12);
        assert!(w[12] > w[13]);
    }

    #[test]
    fn pool_of_one_returns_best_move_for_any_seed() {
        let candidates = lines(&["d2d4", "e2e4", "c2c4"]);
        for seed in 0..50 {
            let mut selector = MoveSelector::seeded(seed);
            assert_eq!(
                selector.select(&candidates, Some("d2d4"), 1).as_deref(),
                Some("d2d4")
            );
        }
    }

    #[test]
    fn single_usable_candidate_returns_best_move() {
        let mut candidates = lines(&["d2d4"]);
        candidates.push(InfoBuilder::new().rank(2).build());
        let mut selector = MoveSelector::seeded(7);

        assert_eq!(
            selector.select(&candidates, Some("g1f3"), 3).as_deref(),
            Some("g1f3")
        );
    }

    #[test]
    fn no_candidates_and_no_best_move_is_none() {
        let mut selector = MoveSelector::seeded(1);
        assert_eq!(selector.select(&[], None, 3), None);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let candidates = lines(&["d2d4", "e2e4", "c2c4"]);
        let first = MoveSelector::seeded(42).select(&candidates, Some("d2d4"), 3);
        for _ in 0..10 {
            let again = MoveSelector::seeded(42).select(&candidates, Some("d2d4"), 3);
            assert_eq!(again, first);
        }
    }

    #[test]
    fn selection_stays_within_pool() {
        let candidates = lines(&["d2d4", "e2e4", "c2c4"]);
        let mut selector = MoveSelector::seeded(3);
        for _ in 0..200 {
            let mv = selector.select(&candidates, Some("d2d4"), 2).unwrap();
            assert!(mv == "d2d4" || mv == "e2e4", "unexpected move {}", mv);
        }
    }

    #[test]
    fn best_candidate_is_favoured_across_seeds() {
        let candidates = lines(&["d2d4", "e2e4", "c2c4"]);
        let mut best = 0;
        let mut third = 0;
        for seed in 0..1000 {
            match MoveSelector::seeded(seed)
                .select(&candidates, Some("d2d4"), 3)
                .as_deref()
            {
                Some("d2d4") => best += 1,
                Some("c2c4") => third += 1,
                _ => {}
            }
        }
        assert!(best > third, "best={} third={}", best, third);
        assert!(third > 0);
    }
}
