//! Core types for the Rapport Pulse scoring core
//!
//! This module defines the records that flow into and out of each scorer:
//! normalized contact records, the two decay tier scales, seed recommendations,
//! and the friction window/alert pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default desired interval between contacts, in days
pub const DEFAULT_TARGET_FREQUENCY_DAYS: u32 = 30;

/// How much a relationship matters to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }

    /// Parse a loosely-formatted importance label.
    ///
    /// Returns `None` for anything unrecognized so callers can apply their own default.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Some(Importance::High),
            "medium" | "med" | "m" | "normal" => Some(Importance::Medium),
            "low" | "l" => Some(Importance::Low),
            _ => None,
        }
    }
}

/// Three-tier dashboard health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Nurtured,
    Drifting,
    Neglected,
}

impl HealthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthTier::Nurtured => "nurtured",
            HealthTier::Drifting => "drifting",
            HealthTier::Neglected => "neglected",
        }
    }
}

/// Four-tier garden classification.
///
/// Thresholded independently of [`HealthTier`]; the two are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GardenTier {
    Blooming,
    Nourished,
    Thirsty,
    Fading,
}

impl GardenTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            GardenTier::Blooming => "blooming",
            GardenTier::Nourished => "nourished",
            GardenTier::Thirsty => "thirsty",
            GardenTier::Fading => "fading",
        }
    }
}

/// Normalized contact record consumed by the scorers.
///
/// Upstream schema variations (several candidate date fields, optional importance)
/// are resolved into this shape by [`crate::schema::ContactAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEngagementRecord {
    /// Stable contact identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Most recent interaction, `None` if never contacted
    #[serde(default)]
    pub last_contact: Option<DateTime<Utc>>,
    /// Relationship importance (defaults to medium)
    #[serde(default)]
    pub importance: Importance,
    /// Desired days between contacts, always > 0
    #[serde(default = "default_target_frequency_days")]
    pub target_frequency_days: u32,
}

fn default_target_frequency_days() -> u32 {
    DEFAULT_TARGET_FREQUENCY_DAYS
}

impl ContactEngagementRecord {
    /// Create a never-contacted, medium-importance record
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_contact: None,
            importance: Importance::Medium,
            target_frequency_days: DEFAULT_TARGET_FREQUENCY_DAYS,
        }
    }

    pub fn with_last_contact(mut self, last_contact: DateTime<Utc>) -> Self {
        self.last_contact = Some(last_contact);
        self
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_target_frequency_days(mut self, days: u32) -> Self {
        self.target_frequency_days = days.max(1);
        self
    }
}

/// A ranked "who to contact next" entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecommendation {
    pub contact_id: String,
    pub name: String,
    pub importance: Importance,
    /// Days since last contact; never-contacted uses the configured sentinel (100)
    pub days_since_contact: i64,
    /// Overdue ratio scaled by importance weight
    pub score: f64,
    /// Human-readable explanation, e.g. "Late by 143% (20/14d)"
    pub reason: String,
}

/// Most recent outreach, used to annotate a friction alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

/// Parallel daily funnel counters, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrictionWindow {
    pub requests: Vec<u64>,
    pub approvals: Vec<u64>,
}

impl FrictionWindow {
    pub fn new(requests: Vec<u64>, approvals: Vec<u64>) -> Self {
        Self {
            requests,
            approvals,
        }
    }

    /// Number of days that have both a request and an approval count
    pub fn len(&self) -> usize {
        self.requests.len().min(self.approvals.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `n` most recent (requests, approvals) pairs, oldest first.
    ///
    /// Sequences of unequal length are aligned on their most recent entry.
    pub fn tail(&self, n: usize) -> Vec<(u64, u64)> {
        let take = n.min(self.len());
        let requests = &self.requests[self.requests.len() - take..];
        let approvals = &self.approvals[self.approvals.len() - take..];
        requests.iter().copied().zip(approvals.iter().copied()).collect()
    }
}

/// Context captured at the moment an alert is raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    pub source_text: String,
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    /// Display label, e.g. "50% Resonance"
    pub formatted: String,
}

/// Sustained-friction alert over an outreach funnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionAlert {
    pub active: bool,
    /// Approval rate over the window, 0-100
    pub resonance_score: u8,
    pub snapshot: AlertSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_importance_parse_lenient() {
        assert_eq!(Importance::parse_lenient(" HIGH "), Some(Importance::High));
        assert_eq!(Importance::parse_lenient("med"), Some(Importance::Medium));
        assert_eq!(Importance::parse_lenient("low"), Some(Importance::Low));
        assert_eq!(Importance::parse_lenient("vip"), None);
    }

    #[test]
    fn test_record_defaults_from_json() {
        let record: ContactEngagementRecord = serde_json::from_str(r#"{"id": "c1"}"#).unwrap();

        assert_eq!(record.importance, Importance::Medium);
        assert_eq!(record.target_frequency_days, 30);
        assert_eq!(record.last_contact, None);
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_window_tail_aligns_on_most_recent() {
        let window = FrictionWindow::new(vec![1, 2, 3, 4, 5], vec![10, 20, 30]);

        assert_eq!(window.len(), 3);
        assert_eq!(window.tail(2), vec![(4, 20), (5, 30)]);
        assert_eq!(window.tail(10), vec![(3, 10), (4, 20), (5, 30)]);
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&HealthTier::Drifting).unwrap(), "\"drifting\"");
        assert_eq!(serde_json::to_string(&GardenTier::Thirsty).unwrap(), "\"thirsty\"");
        assert_eq!(GardenTier::Fading.as_str(), "fading");
    }
}
