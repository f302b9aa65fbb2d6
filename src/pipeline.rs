//! Pipeline orchestration
//!
//! This module provides the JSON-facing API for Rapport Pulse. It wires the
//! contact adapter, scorers, report encoder and friction detector together for
//! hosts that exchange plain JSON strings (the CLI and the C bindings).

use crate::config::PulseConfig;
use crate::error::PulseError;
use crate::friction::{FrictionTransition, FrictionTrendDetector};
use crate::report::ReportEncoder;
use crate::schema::ContactAdapter;
use crate::seeds::SeedScorer;
use crate::store::{EngagementSession, KeyValueStore};
use crate::types::{
    ContactEngagementRecord, FrictionAlert, FrictionWindow, OutreachContext, SeedRecommendation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Funnel counters plus the optional outreach context, as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrictionRequest {
    #[serde(flatten)]
    pub window: FrictionWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<OutreachContext>,
}

/// Outcome of a friction recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionResponse {
    pub transition: FrictionTransition,
    pub alert: Option<FrictionAlert>,
}

/// Rank contacts from a JSON array or NDJSON payload.
///
/// # Arguments
/// * `raw_json` - Contacts in rapport.contact.v1 shape
/// * `limit` - Maximum number of seeds to return
///
/// # Returns
/// JSON array of seed recommendations, most urgent first
///
/// # Example
/// ```ignore
/// let seeds = contacts_to_seeds(r#"[{"id": "c1", "importance": "high"}]"#, 5)?;
/// ```
pub fn contacts_to_seeds(raw_json: &str, limit: usize) -> Result<String, PulseError> {
    contacts_to_seeds_at(raw_json, limit, Utc::now())
}

/// [`contacts_to_seeds`] at a fixed reference time
pub fn contacts_to_seeds_at(
    raw_json: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<String, PulseError> {
    let records = ContactAdapter::parse_records(raw_json)?;
    let seeds = SeedScorer::default().compute_seeds(&records, limit, now);
    Ok(serde_json::to_string(&seeds)?)
}

/// Build a dashboard report from a JSON array or NDJSON payload
pub fn contacts_to_report(raw_json: &str) -> Result<String, PulseError> {
    let records = ContactAdapter::parse_records(raw_json)?;
    ReportEncoder::new().encode_to_json(&records, Utc::now())
}

/// One-shot friction evaluation with no prior alert.
///
/// Returns the alert JSON, or `null` when the window shows no sustained friction
/// (or holds too few samples).
pub fn evaluate_friction(request_json: &str) -> Result<String, PulseError> {
    let request: FrictionRequest = serde_json::from_str(request_json)?;
    let mut detector = FrictionTrendDetector::default();
    detector.evaluate(&request.window, request.context.as_ref(), Utc::now());
    Ok(serde_json::to_string(&detector.alert())?)
}

/// Stateful processor that carries configuration and the friction alert across calls.
pub struct PulseProcessor {
    config: PulseConfig,
    scorer: SeedScorer,
    encoder: ReportEncoder,
    friction: FrictionTrendDetector,
}

impl Default for PulseProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::build(PulseConfig::default())
    }

    /// Create a processor from a validated configuration
    pub fn with_config(config: PulseConfig) -> Result<Self, PulseError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PulseConfig) -> Self {
        Self {
            scorer: SeedScorer::new(config.seeds.clone()),
            encoder: ReportEncoder::new().with_seed_config(config.seeds.clone()),
            friction: FrictionTrendDetector::new(config.friction.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// Rank normalized contacts using the configured table and limit
    pub fn seeds(
        &self,
        contacts: &[ContactEngagementRecord],
        now: DateTime<Utc>,
    ) -> Vec<SeedRecommendation> {
        self.scorer.compute_seeds(contacts, self.config.seeds.limit, now)
    }

    /// Rank contacts from a raw payload, returning seed JSON
    pub fn seeds_json(&self, raw_json: &str, now: DateTime<Utc>) -> Result<String, PulseError> {
        let records = ContactAdapter::parse_records(raw_json)?;
        Ok(serde_json::to_string(&self.seeds(&records, now))?)
    }

    /// Build a dashboard report from a raw payload
    pub fn report_json(&self, raw_json: &str, now: DateTime<Utc>) -> Result<String, PulseError> {
        let records = ContactAdapter::parse_records(raw_json)?;
        self.encoder.encode_to_json(&records, now)
    }

    /// Feed the latest funnel window to the friction detector
    pub fn observe_friction(
        &mut self,
        window: &FrictionWindow,
        context: Option<&OutreachContext>,
        now: DateTime<Utc>,
    ) -> FrictionResponse {
        let transition = self.friction.observe(window, context, now);
        FrictionResponse {
            transition,
            alert: self.friction.alert().cloned(),
        }
    }

    /// [`PulseProcessor::observe_friction`] over a JSON [`FrictionRequest`]
    pub fn observe_friction_json(
        &mut self,
        request_json: &str,
        now: DateTime<Utc>,
    ) -> Result<String, PulseError> {
        let request: FrictionRequest = serde_json::from_str(request_json)?;
        let response = self.observe_friction(&request.window, request.context.as_ref(), now);
        Ok(serde_json::to_string(&response)?)
    }

    /// The active friction alert, if any
    pub fn alert(&self) -> Option<&FrictionAlert> {
        self.friction.alert()
    }

    /// Dismiss the active alert. Returns whether one was active.
    pub fn dismiss_alert(&mut self) -> bool {
        self.friction.dismiss().is_some()
    }

    /// Load friction detector state from JSON
    pub fn load_friction_state(&mut self, json: &str) -> Result<(), PulseError> {
        self.friction = FrictionTrendDetector::from_json(json)
            .map_err(|e| PulseError::ParseError(e.to_string()))?
            .with_config(self.config.friction.clone());
        Ok(())
    }

    /// Save friction detector state to JSON
    pub fn save_friction_state(&self) -> Result<String, PulseError> {
        self.friction
            .to_json()
            .map_err(|e| PulseError::EncodingError(e.to_string()))
    }

    /// Open the engagement record in `store` using the configured level table
    pub fn open_engagement<S: KeyValueStore>(&self, store: S) -> Result<EngagementSession<S>, PulseError> {
        EngagementSession::open_with_thresholds(store, self.config.levels.clone())
    }
}
