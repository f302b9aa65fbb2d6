//! Seed selection
//!
//! Ranks contacts by how overdue they are relative to an importance-specific
//! target interval:
//!
//! - `ratio = days_since_contact / target` (> 1.0 means overdue)
//! - `score = ratio * weight`
//!
//! Never-contacted records use a capped sentinel (100 days) rather than infinity
//! so they weigh heavily without swamping every other signal.

use crate::config::SeedConfig;
use crate::decay::elapsed_days;
use crate::error::PulseError;
use crate::types::{ContactEngagementRecord, SeedRecommendation};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Upstream collaborator that supplies one page of contacts
pub trait ContactSource {
    fn fetch_contacts(&self) -> Result<Vec<ContactEngagementRecord>, PulseError>;
}

impl<F> ContactSource for F
where
    F: Fn() -> Result<Vec<ContactEngagementRecord>, PulseError>,
{
    fn fetch_contacts(&self) -> Result<Vec<ContactEngagementRecord>, PulseError> {
        self()
    }
}

/// Seed ranker over normalized contact records
pub struct SeedScorer {
    config: SeedConfig,
}

impl Default for SeedScorer {
    fn default() -> Self {
        Self::new(SeedConfig::default())
    }
}

impl SeedScorer {
    pub fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Score every contact, sort descending by score and keep the top `limit`.
    ///
    /// The sort is stable: contacts with equal scores keep their input order.
    pub fn compute_seeds(
        &self,
        contacts: &[ContactEngagementRecord],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<SeedRecommendation> {
        let mut seeds: Vec<SeedRecommendation> = contacts
            .iter()
            .map(|contact| self.score_contact(contact, now))
            .collect();

        seeds.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        seeds.truncate(limit);

        tracing::debug!(
            contacts = contacts.len(),
            returned = seeds.len(),
            "computed seed recommendations"
        );

        seeds
    }

    /// Fetch contacts from `source` and rank them.
    ///
    /// A failing source yields an empty list; the failure is logged, not returned.
    pub fn seeds_from_source(
        &self,
        source: &dyn ContactSource,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<SeedRecommendation> {
        match source.fetch_contacts() {
            Ok(contacts) => self.compute_seeds(&contacts, limit, now),
            Err(e) => {
                tracing::warn!(error = %e, "contact fetch failed, returning no seeds");
                Vec::new()
            }
        }
    }

    /// Score a single contact
    pub fn score_contact(
        &self,
        contact: &ContactEngagementRecord,
        now: DateTime<Utc>,
    ) -> SeedRecommendation {
        let days_since_contact = match contact.last_contact {
            Some(date) => elapsed_days(date, now),
            None => self.config.never_contacted_days,
        };

        let entry = self.config.table.get(contact.importance);
        let target = entry.target_days.max(1);
        let ratio = days_since_contact as f64 / f64::from(target);
        let score = ratio * entry.weight;

        SeedRecommendation {
            contact_id: contact.id.clone(),
            name: contact.name.clone(),
            importance: contact.importance,
            days_since_contact,
            score,
            reason: format!(
                "Late by {}% ({}/{}d)",
                (ratio * 100.0).round() as i64,
                days_since_contact,
                target
            ),
        }
    }
}

/// Rank contacts with the default weight table
pub fn compute_seeds(
    contacts: &[ContactEngagementRecord],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<SeedRecommendation> {
    SeedScorer::default().compute_seeds(contacts, limit, now)
}

/// [`compute_seeds`] against the system clock
pub fn compute_seeds_now(contacts: &[ContactEngagementRecord], limit: usize) -> Vec<SeedRecommendation> {
    compute_seeds(contacts, limit, Utc::now())
}
