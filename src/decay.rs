//! Relationship decay classification
//!
//! This module maps "days since last contact" against a contact's target
//! frequency onto two independent tier scales:
//!
//! - [`HealthTier`]: the three-tier dashboard scale (nurtured / drifting / neglected)
//! - [`GardenTier`]: the four-tier garden scale (blooming / nourished / thirsty / fading)
//!
//! The scales share only [`elapsed_days`]. Their thresholds are separate constants
//! and they disagree near the boundaries (day 37 of a 30-day target is `neglected`
//! on one and `nourished` on the other).

use crate::types::{GardenTier, HealthTier};
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Upper bound for `drifting`, as a percentage of the target interval
pub const DRIFTING_LIMIT_PCT: i64 = 120;

/// Upper bound for `nourished`, as a percentage of the target interval
pub const NOURISHED_LIMIT_PCT: i64 = 150;

/// Upper bound for `thirsty`, as a percentage of the target interval
pub const THIRSTY_LIMIT_PCT: i64 = 200;

/// Whole days between two instants, rounded up.
///
/// The distance is absolute, so a contact date in the future counts the same as
/// one in the past. Any partial day counts as a full day.
pub fn elapsed_days(last_contact: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - last_contact).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Classify a contact on the three-tier dashboard scale.
///
/// A missing date means the contact was never reached and is `Neglected`.
pub fn classify_health(
    last_contact: Option<DateTime<Utc>>,
    target_days: u32,
    now: DateTime<Utc>,
) -> HealthTier {
    let Some(last_contact) = last_contact else {
        return HealthTier::Neglected;
    };

    let elapsed = elapsed_days(last_contact, now);
    let target = i64::from(target_days);

    if elapsed <= target {
        HealthTier::Nurtured
    } else if elapsed * 100 <= target * DRIFTING_LIMIT_PCT {
        HealthTier::Drifting
    } else {
        HealthTier::Neglected
    }
}

/// [`classify_health`] against the system clock
pub fn classify_health_now(last_contact: Option<DateTime<Utc>>, target_days: u32) -> HealthTier {
    classify_health(last_contact, target_days, Utc::now())
}

/// Classify an elapsed-day count on the four-tier garden scale
pub fn garden_label(elapsed_days: i64, target_days: u32) -> GardenTier {
    let target = i64::from(target_days);

    if elapsed_days <= target {
        GardenTier::Blooming
    } else if elapsed_days * 100 <= target * NOURISHED_LIMIT_PCT {
        GardenTier::Nourished
    } else if elapsed_days * 100 <= target * THIRSTY_LIMIT_PCT {
        GardenTier::Thirsty
    } else {
        GardenTier::Fading
    }
}

/// Garden tier for an optional contact date.
///
/// Never-contacted relationships are `Fading`.
pub fn garden_label_for(
    last_contact: Option<DateTime<Utc>>,
    target_days: u32,
    now: DateTime<Utc>,
) -> GardenTier {
    match last_contact {
        Some(date) => garden_label(elapsed_days(date, now), target_days),
        None => GardenTier::Fading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    #[test]
    fn test_elapsed_days_rounds_up() {
        assert_eq!(elapsed_days(now(), now()), 0);
        assert_eq!(elapsed_days(now() - Duration::hours(1), now()), 1);
        assert_eq!(elapsed_days(now() - Duration::hours(25), now()), 2);
        assert_eq!(elapsed_days(now() - Duration::days(3), now()), 3);
    }

    #[test]
    fn test_elapsed_days_is_absolute() {
        assert_eq!(elapsed_days(now() + Duration::days(4), now()), 4);
    }

    #[test]
    fn test_missing_date_is_neglected() {
        assert_eq!(classify_health(None, 30, now()), HealthTier::Neglected);
        assert_eq!(garden_label_for(None, 30, now()), GardenTier::Fading);
    }

    #[test]
    fn test_health_target_boundary_is_inclusive() {
        assert_eq!(classify_health(days_ago(30), 30, now()), HealthTier::Nurtured);
        assert_eq!(classify_health(days_ago(14), 14, now()), HealthTier::Nurtured);
    }

    #[test]
    fn test_health_tiers_at_thirty_day_target() {
        assert_eq!(classify_health(days_ago(31), 30, now()), HealthTier::Drifting);
        assert_eq!(classify_health(days_ago(36), 30, now()), HealthTier::Drifting);
        assert_eq!(classify_health(days_ago(37), 30, now()), HealthTier::Neglected);
    }

    #[test]
    fn test_health_one_past_drift_limit_is_neglected() {
        for target in [7u32, 14, 30, 45, 90] {
            let limit = (f64::from(target) * 1.2).ceil() as i64;
            assert_eq!(
                classify_health(days_ago(limit + 1), target, now()),
                HealthTier::Neglected,
                "target {target}"
            );
        }
    }

    #[test]
    fn test_garden_tiers_at_thirty_day_target() {
        assert_eq!(garden_label(0, 30), GardenTier::Blooming);
        assert_eq!(garden_label(30, 30), GardenTier::Blooming);
        assert_eq!(garden_label(31, 30), GardenTier::Nourished);
        assert_eq!(garden_label(45, 30), GardenTier::Nourished);
        assert_eq!(garden_label(46, 30), GardenTier::Thirsty);
        assert_eq!(garden_label(60, 30), GardenTier::Thirsty);
        assert_eq!(garden_label(61, 30), GardenTier::Fading);
    }

    #[test]
    fn test_scales_disagree_near_boundaries() {
        let last = days_ago(37);
        assert_eq!(classify_health(last, 30, now()), HealthTier::Neglected);
        assert_eq!(garden_label_for(last, 30, now()), GardenTier::Nourished);
    }

    proptest! {
        #[test]
        fn prop_classification_is_idempotent(elapsed in 0i64..1_000, target in 1u32..365) {
            let last = Some(now() - Duration::days(elapsed));
            prop_assert_eq!(
                classify_health(last, target, now()),
                classify_health(last, target, now())
            );
            prop_assert_eq!(garden_label(elapsed, target), garden_label(elapsed, target));
        }

        #[test]
        fn prop_garden_tier_never_improves_with_age(elapsed in 0i64..1_000, target in 1u32..365) {
            let rank = |tier: GardenTier| tier as u8;
            prop_assert!(rank(garden_label(elapsed, target)) <= rank(garden_label(elapsed + 1, target)));
        }
    }
}
