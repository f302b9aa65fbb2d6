//! Engagement streaks and levels
//!
//! Tracks consecutive calendar days with at least one completed engagement, total
//! XP, and a level derived from cumulative XP thresholds. Calendar days are taken
//! in the timezone of the `now` passed to [`EngagementStreakTracker::record_engagement_at`];
//! time of day is ignored.

use crate::config::LEVEL_THRESHOLDS;
use crate::error::PulseError;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted engagement record. Zero-valued when first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementState {
    pub total_xp: u64,
    pub level: u32,
    pub current_streak: u32,
    pub last_played_date: Option<DateTime<Utc>>,
    pub games_played: u64,
    pub best_scores: BTreeMap<String, u64>,
}

impl Default for EngagementState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: 1,
            current_streak: 0,
            last_played_date: None,
            games_played: 0,
            best_scores: BTreeMap::new(),
        }
    }
}

/// How a recorded engagement moved the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// Already credited today
    Unchanged,
    /// Played yesterday, streak extended
    Extended,
    /// First play or a gap of more than one day
    Reset,
}

/// Summary of one recorded engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub streak_change: StreakChange,
    pub current_streak: u32,
    pub level_before: u32,
    pub level_after: u32,
    pub total_xp: u64,
    pub new_best: bool,
}

impl StreakUpdate {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Highest 1-based level whose threshold `total_xp` has reached
pub fn level_for_xp(total_xp: u64, thresholds: &[u64]) -> u32 {
    thresholds
        .iter()
        .rposition(|&threshold| total_xp >= threshold)
        .map(|index| index as u32 + 1)
        .unwrap_or(1)
}

/// Streak and level bookkeeping over an [`EngagementState`]
#[derive(Debug, Clone)]
pub struct EngagementStreakTracker {
    state: EngagementState,
    thresholds: Vec<u64>,
}

impl Default for EngagementStreakTracker {
    fn default() -> Self {
        Self::from_state(EngagementState::default())
    }
}

impl EngagementStreakTracker {
    /// Wrap a loaded state using the default level table
    pub fn from_state(state: EngagementState) -> Self {
        Self::with_thresholds(state, LEVEL_THRESHOLDS.to_vec())
    }

    /// Wrap a loaded state with a custom level table.
    ///
    /// The stored level is re-derived from `total_xp` but never lowered.
    pub fn with_thresholds(mut state: EngagementState, thresholds: Vec<u64>) -> Self {
        state.level = level_for_xp(state.total_xp, &thresholds).max(state.level);
        Self { state, thresholds }
    }

    pub fn state(&self) -> &EngagementState {
        &self.state
    }

    pub fn into_state(self) -> EngagementState {
        self.state
    }

    /// Record a completed engagement against the local clock
    pub fn record_engagement(&mut self, mode: &str, score: u64) -> StreakUpdate {
        self.record_engagement_at(mode, score, Local::now())
    }

    /// Record a completed engagement at `now`.
    ///
    /// Streak rules, comparing calendar dates in `now`'s timezone:
    /// same day as last play leaves the streak alone, the following day extends
    /// it, anything else resets it to 1.
    pub fn record_engagement_at<Tz: TimeZone>(
        &mut self,
        mode: &str,
        score: u64,
        now: DateTime<Tz>,
    ) -> StreakUpdate {
        let today = now.date_naive();
        let last_played = self
            .state
            .last_played_date
            .map(|date| date.with_timezone(&now.timezone()).date_naive());

        let streak_change = match last_played {
            Some(last) if last == today => StreakChange::Unchanged,
            Some(last) if Some(last) == today.pred_opt() => {
                self.state.current_streak += 1;
                StreakChange::Extended
            }
            _ => {
                self.state.current_streak = 1;
                StreakChange::Reset
            }
        };

        self.state.games_played += 1;
        self.state.last_played_date = Some(now.with_timezone(&Utc));

        let best = self.state.best_scores.entry(mode.to_string()).or_insert(0);
        let new_best = score > *best;
        if new_best {
            *best = score;
        }

        let level_before = self.state.level;
        self.add_xp(score);

        tracing::debug!(
            mode,
            score,
            streak = self.state.current_streak,
            ?streak_change,
            "engagement recorded"
        );

        StreakUpdate {
            streak_change,
            current_streak: self.state.current_streak,
            level_before,
            level_after: self.state.level,
            total_xp: self.state.total_xp,
            new_best,
        }
    }

    /// Add XP and recompute the level. Returns the level after the update.
    pub fn add_xp(&mut self, xp: u64) -> u32 {
        self.state.total_xp = self.state.total_xp.saturating_add(xp);

        let level = level_for_xp(self.state.total_xp, &self.thresholds).max(self.state.level);
        if level > self.state.level {
            tracing::info!(
                level,
                total_xp = self.state.total_xp,
                "engagement level up"
            );
        }
        self.state.level = level;
        level
    }

    /// XP still needed for the next level, `None` at the top of the table
    pub fn xp_to_next_level(&self) -> Option<u64> {
        self.thresholds
            .get(self.state.level as usize)
            .map(|&next| next.saturating_sub(self.state.total_xp))
    }

    /// Load tracker state from JSON
    pub fn from_json(json: &str) -> Result<Self, PulseError> {
        Ok(Self::from_state(serde_json::from_str(json)?))
    }

    /// Serialize tracker state to JSON
    pub fn to_json(&self) -> Result<String, PulseError> {
        Ok(serde_json::to_string(&self.state)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(n: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, n, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_play_starts_streak() {
        let mut tracker = EngagementStreakTracker::default();
        let update = tracker.record_engagement_at("quiz", 120, day(1, 9));

        assert_eq!(update.streak_change, StreakChange::Reset);
        assert_eq!(tracker.state().current_streak, 1);
        assert_eq!(tracker.state().games_played, 1);
        assert_eq!(tracker.state().last_played_date, Some(day(1, 9)));
    }

    #[test]
    fn test_consecutive_days_extend_streak() {
        let mut tracker = EngagementStreakTracker::default();
        tracker.record_engagement_at("quiz", 10, day(1, 23));
        let update = tracker.record_engagement_at("quiz", 10, day(2, 0));

        assert_eq!(update.streak_change, StreakChange::Extended);
        assert_eq!(update.current_streak, 2);
    }

    #[test]
    fn test_same_day_leaves_streak() {
        let mut tracker = EngagementStreakTracker::default();
        tracker.record_engagement_at("quiz", 10, day(1, 9));
        tracker.record_engagement_at("quiz", 10, day(2, 9));
        let update = tracker.record_engagement_at("match", 10, day(2, 21));

        assert_eq!(update.streak_change, StreakChange::Unchanged);
        assert_eq!(tracker.state().current_streak, 2);
        assert_eq!(tracker.state().games_played, 3);
    }

    #[test]
    fn test_gap_resets_streak() {
        let mut tracker = EngagementStreakTracker::default();
        tracker.record_engagement_at("quiz", 10, day(1, 9));
        tracker.record_engagement_at("quiz", 10, day(2, 9));
        let update = tracker.record_engagement_at("quiz", 10, day(5, 9));

        assert_eq!(update.streak_change, StreakChange::Reset);
        assert_eq!(tracker.state().current_streak, 1);
    }

    #[test]
    fn test_calendar_days_follow_caller_timezone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let mut tracker = EngagementStreakTracker::default();

        // 2024-07-01 20:00 UTC is 2024-07-02 05:00 in Tokyo
        tracker.record_engagement_at("quiz", 10, day(1, 20).with_timezone(&tokyo));
        // 2024-07-02 10:00 UTC is still 2024-07-02 in Tokyo
        let update = tracker.record_engagement_at("quiz", 10, day(2, 10).with_timezone(&tokyo));

        assert_eq!(update.streak_change, StreakChange::Unchanged);
        assert_eq!(update.current_streak, 1);
    }

    #[test]
    fn test_best_scores_keep_maximum_per_mode() {
        let mut tracker = EngagementStreakTracker::default();
        assert!(tracker.record_engagement_at("quiz", 300, day(1, 9)).new_best);
        assert!(!tracker.record_engagement_at("quiz", 200, day(1, 10)).new_best);
        tracker.record_engagement_at("match", 50, day(1, 11));

        assert_eq!(tracker.state().best_scores.get("quiz"), Some(&300));
        assert_eq!(tracker.state().best_scores.get("match"), Some(&50));
    }

    #[test]
    fn test_level_thresholds() {
        let table = LEVEL_THRESHOLDS;
        assert_eq!(level_for_xp(0, &table), 1);
        assert_eq!(level_for_xp(499, &table), 1);
        assert_eq!(level_for_xp(500, &table), 2);
        assert_eq!(level_for_xp(1500, &table), 3);
        assert_eq!(level_for_xp(49_999, &table), 5);
        assert_eq!(level_for_xp(50_000, &table), 6);
        assert_eq!(level_for_xp(u64::MAX, &table), 6);
    }

    #[test]
    fn test_score_feeds_xp_and_level() {
        let mut tracker = EngagementStreakTracker::default();
        let update = tracker.record_engagement_at("quiz", 499, day(1, 9));
        assert_eq!(update.level_after, 1);
        assert!(!update.leveled_up());

        let update = tracker.record_engagement_at("quiz", 1, day(1, 10));
        assert_eq!(update.total_xp, 500);
        assert_eq!(update.level_after, 2);
        assert!(update.leveled_up());
        assert_eq!(tracker.xp_to_next_level(), Some(1000));
    }

    #[test]
    fn test_xp_to_next_level_at_cap() {
        let mut tracker = EngagementStreakTracker::default();
        tracker.add_xp(60_000);
        assert_eq!(tracker.state().level, 6);
        assert_eq!(tracker.xp_to_next_level(), None);
    }

    #[test]
    fn test_missing_fields_load_as_defaults() {
        let tracker = EngagementStreakTracker::from_json(r#"{"total_xp": 700}"#).unwrap();

        assert_eq!(tracker.state().total_xp, 700);
        assert_eq!(tracker.state().level, 2);
        assert_eq!(tracker.state().current_streak, 0);
        assert!(tracker.state().best_scores.is_empty());
    }

    #[test]
    fn test_state_round_trip() {
        let mut tracker = EngagementStreakTracker::default();
        tracker.record_engagement_at("quiz", 800, day(3, 9));

        let loaded = EngagementStreakTracker::from_json(&tracker.to_json().unwrap()).unwrap();
        assert_eq!(loaded.state(), tracker.state());
    }

    proptest! {
        #[test]
        fn prop_level_never_decreases(scores in proptest::collection::vec(0u64..20_000, 1..40)) {
            let mut tracker = EngagementStreakTracker::default();
            let mut previous = tracker.state().level;
            for score in scores {
                let level = tracker.add_xp(score);
                prop_assert!(level >= previous);
                previous = level;
            }
        }
    }
}
