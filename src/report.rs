//! Dashboard report encoding
//!
//! Bundles the per-contact decay tiers, tier counts and top seeds into a single
//! serializable payload with producer metadata.

use crate::config::SeedConfig;
use crate::decay::{classify_health, elapsed_days, garden_label_for};
use crate::error::PulseError;
use crate::seeds::SeedScorer;
use crate::types::{ContactEngagementRecord, GardenTier, HealthTier, Importance, SeedRecommendation};
use crate::{PRODUCER_NAME, PULSE_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current dashboard report version
pub const REPORT_VERSION: &str = "rapport.dashboard.v1";

/// Who produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Decay view of a single contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactHealth {
    pub contact_id: String,
    pub name: String,
    pub importance: Importance,
    /// `None` when the contact has never been reached
    pub days_since_contact: Option<i64>,
    pub target_frequency_days: u32,
    pub health: HealthTier,
    pub garden: GardenTier,
}

/// Number of contacts in each dashboard tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub nurtured: usize,
    pub drifting: usize,
    pub neglected: usize,
}

impl TierCounts {
    fn add(&mut self, tier: HealthTier) {
        match tier {
            HealthTier::Nurtured => self.nurtured += 1,
            HealthTier::Drifting => self.drifting += 1,
            HealthTier::Neglected => self.neglected += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.nurtured + self.drifting + self.neglected
    }
}

/// Dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: DateTime<Utc>,
    pub tier_counts: TierCounts,
    pub contacts: Vec<ContactHealth>,
    pub seeds: Vec<SeedRecommendation>,
}

/// Encoder for dashboard reports
pub struct ReportEncoder {
    instance_id: String,
    scorer: SeedScorer,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self::with_instance_id(Uuid::new_v4().to_string())
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            scorer: SeedScorer::default(),
        }
    }

    /// Use a custom seed configuration
    pub fn with_seed_config(mut self, config: SeedConfig) -> Self {
        self.scorer = SeedScorer::new(config);
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report for `contacts` as of `now`
    pub fn encode(&self, contacts: &[ContactEngagementRecord], now: DateTime<Utc>) -> DashboardReport {
        let mut tier_counts = TierCounts::default();

        let contact_health: Vec<ContactHealth> = contacts
            .iter()
            .map(|contact| {
                let health = classify_health(contact.last_contact, contact.target_frequency_days, now);
                tier_counts.add(health);

                ContactHealth {
                    contact_id: contact.id.clone(),
                    name: contact.name.clone(),
                    importance: contact.importance,
                    days_since_contact: contact.last_contact.map(|date| elapsed_days(date, now)),
                    target_frequency_days: contact.target_frequency_days,
                    health,
                    garden: garden_label_for(contact.last_contact, contact.target_frequency_days, now),
                }
            })
            .collect();

        let seeds = self
            .scorer
            .compute_seeds(contacts, self.scorer.config().limit, now);

        DashboardReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: now,
            tier_counts,
            contacts: contact_health,
            seeds,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        contacts: &[ContactEngagementRecord],
        now: DateTime<Utc>,
    ) -> Result<String, PulseError> {
        let report = self.encode(contacts, now);
        serde_json::to_string(&report).map_err(|e| PulseError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn contacts() -> Vec<ContactEngagementRecord> {
        vec![
            ContactEngagementRecord::new("fresh", "Fresh").with_last_contact(now() - Duration::days(3)),
            ContactEngagementRecord::new("drift", "Drift").with_last_contact(now() - Duration::days(33)),
            ContactEngagementRecord::new("lost", "Lost").with_last_contact(now() - Duration::days(40)),
            ContactEngagementRecord::new("never", "Never").with_importance(Importance::High),
        ]
    }

    #[test]
    fn test_tier_counts() {
        let report = ReportEncoder::with_instance_id("test".to_string()).encode(&contacts(), now());

        assert_eq!(
            report.tier_counts,
            TierCounts {
                nurtured: 1,
                drifting: 1,
                neglected: 2,
            }
        );
        assert_eq!(report.tier_counts.total(), 4);
    }

    #[test]
    fn test_contact_rows() {
        let report = ReportEncoder::new().encode(&contacts(), now());

        let lost = report.contacts.iter().find(|c| c.contact_id == "lost").unwrap();
        assert_eq!(lost.days_since_contact, Some(40));
        assert_eq!(lost.health, HealthTier::Neglected);
        assert_eq!(lost.garden, GardenTier::Nourished);

        let never = report.contacts.iter().find(|c| c.contact_id == "never").unwrap();
        assert_eq!(never.days_since_contact, None);
        assert_eq!(never.garden, GardenTier::Fading);
    }

    #[test]
    fn test_seeds_lead_with_most_urgent() {
        let report = ReportEncoder::new().encode(&contacts(), now());

        assert_eq!(report.seeds.len(), 4);
        assert_eq!(report.seeds[0].contact_id, "never");
    }

    #[test]
    fn test_producer_metadata() {
        let json = ReportEncoder::with_instance_id("inst-1".to_string())
            .encode_to_json(&contacts(), now())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["producer"]["instance_id"], "inst-1");
        assert_eq!(value["contacts"][1]["health"], "drifting");
    }

    #[test]
    fn test_seed_limit_from_config() {
        let config = SeedConfig {
            limit: 2,
            ..SeedConfig::default()
        };
        let report = ReportEncoder::new().with_seed_config(config).encode(&contacts(), now());

        assert_eq!(report.seeds.len(), 2);
        assert_eq!(report.contacts.len(), 4);
    }
}
