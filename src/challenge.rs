//! Challenge scoring state machine
//!
//! Shared by every interactive simulation, not just the coaster. A challenge
//! is `Inactive` until started and stays `Active` across rounds until it is
//! explicitly reset. Scores, streaks and attempt counts live here so that
//! editing a track never touches them.

use serde::{Deserialize, Serialize};

/// Qualitative scoring bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Perfect,
    Great,
    Close,
    Miss,
}

impl Tier {
    /// Default point value of the tier
    pub fn points(&self) -> u32 {
        match self {
            Tier::Perfect => 3,
            Tier::Great => 2,
            Tier::Close => 1,
            Tier::Miss => 0,
        }
    }

    pub fn from_points(points: u32) -> Self {
        match points {
            0 => Tier::Miss,
            1 => Tier::Close,
            2 => Tier::Great,
            _ => Tier::Perfect,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Perfect => "perfect",
            Tier::Great => "great",
            Tier::Close => "close",
            Tier::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChallengePhase {
    #[default]
    Inactive,
    Active,
}

/// Result recorded for the current attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResult {
    /// Terminal event tag the result came from (e.g. "derailed")
    pub tag: String,
    pub tier: Tier,
    pub points: u32,
}

/// Cumulative challenge bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    pub phase: ChallengePhase,
    pub score: u64,
    pub attempts: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub last_result: Option<ChallengeResult>,
}

impl ChallengeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.phase == ChallengePhase::Active
    }

    /// Inactive -> Active. Starting an active challenge keeps its history.
    pub fn start(&mut self) {
        if self.phase == ChallengePhase::Inactive {
            log::info!("challenge started");
        }
        self.phase = ChallengePhase::Active;
        self.last_result = None;
    }

    /// Back to a fresh, inactive challenge
    pub fn reset(&mut self) {
        log::info!(
            "challenge reset (score {}, best streak {})",
            self.score,
            self.best_streak
        );
        *self = Self::default();
    }

    /// Clear the previous result at the start of a new attempt
    pub fn begin_attempt(&mut self) {
        self.last_result = None;
    }

    /// Whether `tag` was already submitted for the current attempt
    pub fn has_result(&self, tag: &str) -> bool {
        self.last_result.as_ref().is_some_and(|r| r.tag == tag)
    }

    /// Record one attempt's result. Ignored while inactive.
    ///
    /// Returns false if nothing was recorded.
    pub fn submit_result(&mut self, tag: &str, tier: Tier, points: u32) -> bool {
        if !self.is_active() {
            log::debug!("result {tag} ignored: challenge inactive");
            return false;
        }
        self.attempts += 1;
        self.score += u64::from(points);
        if tier == Tier::Miss {
            self.streak = 0;
        } else {
            self.streak += 1;
        }
        self.best_streak = self.best_streak.max(self.streak);
        self.last_result = Some(ChallengeResult {
            tag: tag.to_string(),
            tier,
            points,
        });
        log::debug!(
            "result {tag}: {} (+{points}), score {}, streak {}",
            tier.as_str(),
            self.score,
            self.streak
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_inactive_ignores_results() {
        let mut challenge = ChallengeState::new();
        assert!(!challenge.submit_result("ride_complete", Tier::Perfect, 3));
        assert_eq!(challenge.attempts, 0);
        assert_eq!(challenge.score, 0);
    }

    #[test]
    fn test_streak_and_best_streak() {
        let mut challenge = ChallengeState::new();
        challenge.start();
        challenge.submit_result("a", Tier::Perfect, 3);
        challenge.submit_result("a", Tier::Close, 1);
        challenge.submit_result("a", Tier::Great, 2);
        assert_eq!(challenge.streak, 3);
        challenge.submit_result("b", Tier::Miss, 0);
        assert_eq!(challenge.streak, 0);
        assert_eq!(challenge.best_streak, 3);
        challenge.submit_result("a", Tier::Great, 2);
        assert_eq!(challenge.streak, 1);
        assert_eq!(challenge.score, 8);
        assert_eq!(challenge.attempts, 5);
    }

    #[test]
    fn test_lifecycle() {
        let mut challenge = ChallengeState::new();
        challenge.start();
        challenge.submit_result("derailed", Tier::Miss, 0);
        assert!(challenge.has_result("derailed"));
        challenge.begin_attempt();
        assert!(!challenge.has_result("derailed"));

        // Restarting an active challenge keeps the score
        challenge.submit_result("ride_complete", Tier::Perfect, 3);
        challenge.start();
        assert_eq!(challenge.score, 3);
        assert!(challenge.is_active());

        challenge.reset();
        assert_eq!(challenge, ChallengeState::default());
        assert!(!challenge.is_active());
    }

    #[test]
    fn test_tier_points_round_trip() {
        for tier in [Tier::Perfect, Tier::Great, Tier::Close, Tier::Miss] {
            assert_eq!(Tier::from_points(tier.points()), tier);
        }
    }

    fn tier_strategy() -> impl Strategy<Value = (Tier, u32)> {
        prop_oneof![
            Just(Tier::Perfect),
            Just(Tier::Great),
            Just(Tier::Close),
            Just(Tier::Miss),
        ]
        .prop_flat_map(|tier| (Just(tier), 0u32..=4))
    }

    proptest! {
        #[test]
        fn prop_scoring_round_trip(results in prop::collection::vec(tier_strategy(), 0..50)) {
            let mut challenge = ChallengeState::new();
            challenge.start();
            let mut expected_streak = 0u32;
            for (tier, points) in &results {
                let before = challenge.streak;
                challenge.submit_result("x", *tier, *points);
                if *tier == Tier::Miss {
                    prop_assert_eq!(challenge.streak, 0);
                    expected_streak = 0;
                } else {
                    prop_assert_eq!(challenge.streak, before + 1);
                    expected_streak += 1;
                }
                prop_assert!(challenge.best_streak >= challenge.streak);
            }
            let total: u64 = results.iter().map(|(_, p)| u64::from(*p)).sum();
            prop_assert_eq!(challenge.score, total);
            prop_assert_eq!(challenge.attempts as usize, results.len());
            prop_assert_eq!(challenge.streak, expected_streak);
        }
    }
}
