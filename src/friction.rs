//! Outreach funnel friction detection
//!
//! Watches a trailing window of daily (requests, approvals) counters and raises an
//! alert when every day in the window converts below the clear threshold. One good
//! day anywhere in the window is enough to clear the condition.
//!
//! The alert has no cooldown: after a manual [`FrictionTrendDetector::dismiss`], the
//! next recompute that still sees sustained friction raises a fresh alert.

use crate::config::FrictionConfig;
use crate::error::PulseError;
use crate::types::{AlertSnapshot, FrictionAlert, FrictionWindow, OutreachContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot text used when no recent outreach is known
pub const FALLBACK_SOURCE_TEXT: &str = "No recent hook found.";

/// Subject id used when no recent outreach is known
pub const FALLBACK_SUBJECT_ID: &str = "unknown";

/// What a recompute did to the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionTransition {
    /// Not enough history; alert state untouched
    Skipped,
    /// A new alert was raised
    Raised,
    /// The active alert was cleared
    Cleared,
    /// Evaluated, nothing changed
    Unchanged,
}

/// Result of evaluating one window, independent of alert state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionReading {
    pub sustained_friction: bool,
    pub resonance_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ObservedInputs {
    window: FrictionWindow,
    context: Option<OutreachContext>,
}

/// Hysteresis-gated friction alert over a funnel time series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrictionTrendDetector {
    #[serde(skip)]
    config: FrictionConfig,
    #[serde(default)]
    alert: Option<FrictionAlert>,
    #[serde(default)]
    last_inputs: Option<ObservedInputs>,
}

impl FrictionTrendDetector {
    pub fn new(config: FrictionConfig) -> Self {
        Self {
            config,
            alert: None,
            last_inputs: None,
        }
    }

    /// Replace the evaluation settings, keeping alert state
    pub fn with_config(mut self, config: FrictionConfig) -> Self {
        self.config = config;
        self
    }

    /// The currently active alert, if any
    pub fn alert(&self) -> Option<&FrictionAlert> {
        self.alert.as_ref()
    }

    /// Measure a window without touching alert state.
    ///
    /// Returns `None` when the window holds fewer samples than the configured length.
    pub fn read(&self, window: &FrictionWindow) -> Option<FrictionReading> {
        if window.len() < self.config.window {
            return None;
        }

        let days = window.tail(self.config.window);

        let sustained_friction = !days
            .iter()
            .any(|&(requests, approvals)| efficiency(requests, approvals) >= self.config.clear_efficiency);

        let total_requests: u64 = days.iter().map(|&(r, _)| r).sum();
        let total_approvals: u64 = days.iter().map(|&(_, a)| a).sum();
        let resonance = (100.0 * total_approvals as f64 / total_requests.max(1) as f64).round();

        Some(FrictionReading {
            sustained_friction,
            resonance_score: resonance.clamp(0.0, 100.0) as u8,
        })
    }

    /// Recompute the alert from `window` unconditionally
    pub fn evaluate(
        &mut self,
        window: &FrictionWindow,
        context: Option<&OutreachContext>,
        now: DateTime<Utc>,
    ) -> FrictionTransition {
        let Some(reading) = self.read(window) else {
            tracing::debug!(samples = window.len(), "friction window too short, skipping");
            return FrictionTransition::Skipped;
        };

        match (reading.sustained_friction, self.alert.is_some()) {
            (true, false) => {
                let alert = build_alert(reading.resonance_score, context, now);
                tracing::info!(
                    resonance = alert.resonance_score,
                    subject = %alert.snapshot.subject_id,
                    "friction alert raised"
                );
                self.alert = Some(alert);
                FrictionTransition::Raised
            }
            (false, true) => {
                tracing::info!(resonance = reading.resonance_score, "friction alert cleared");
                self.alert = None;
                FrictionTransition::Cleared
            }
            _ => FrictionTransition::Unchanged,
        }
    }

    /// Recompute only if the window or context differs from the last observation
    pub fn observe(
        &mut self,
        window: &FrictionWindow,
        context: Option<&OutreachContext>,
        now: DateTime<Utc>,
    ) -> FrictionTransition {
        let inputs = ObservedInputs {
            window: window.clone(),
            context: context.cloned(),
        };

        if self.last_inputs.as_ref() == Some(&inputs) {
            return FrictionTransition::Unchanged;
        }

        self.last_inputs = Some(inputs);
        self.evaluate(window, context, now)
    }

    /// Clear the active alert on behalf of the user
    pub fn dismiss(&mut self) -> Option<FrictionAlert> {
        let dismissed = self.alert.take();
        if dismissed.is_some() {
            tracing::debug!("friction alert dismissed");
        }
        dismissed
    }

    /// Load detector state from JSON.
    ///
    /// Settings are not persisted; the loaded detector uses defaults until
    /// [`FrictionTrendDetector::with_config`] is applied.
    pub fn from_json(json: &str) -> Result<Self, PulseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize detector state to JSON
    pub fn to_json(&self) -> Result<String, PulseError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn efficiency(requests: u64, approvals: u64) -> f64 {
    approvals as f64 / requests.max(1) as f64
}

fn build_alert(
    resonance_score: u8,
    context: Option<&OutreachContext>,
    now: DateTime<Utc>,
) -> FrictionAlert {
    let source_text = context
        .and_then(|c| c.content.clone())
        .unwrap_or_else(|| FALLBACK_SOURCE_TEXT.to_string());
    let subject_id = context
        .and_then(|c| c.subject_id.clone())
        .unwrap_or_else(|| FALLBACK_SUBJECT_ID.to_string());

    FrictionAlert {
        active: true,
        resonance_score,
        snapshot: AlertSnapshot {
            source_text,
            subject_id,
            timestamp: now,
            formatted: format!("{resonance_score}% Resonance"),
        },
    }
}
