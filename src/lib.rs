//! Rapport Pulse - On-device scoring engine for relationship engagement
//!
//! Pulse turns raw interaction timestamps and per-contact cadence targets into
//! signals a relationship app can act on:
//!
//! - **Decay**: health tiers (3-tier dashboard scale, 4-tier garden scale)
//! - **Seeds**: a ranked "who to contact next" list
//! - **Friction**: a hysteresis-gated alert over an outreach funnel
//! - **Streaks**: consecutive-day engagement streaks, XP and levels
//!
//! All scorers are synchronous and take an explicit `now`, so hosts can call them
//! inline from request or UI handlers.

pub mod config;
pub mod decay;
pub mod error;
pub mod friction;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod seeds;
pub mod store;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::PulseConfig;
pub use decay::{classify_health, elapsed_days, garden_label};
pub use error::PulseError;
pub use friction::{FrictionTransition, FrictionTrendDetector};
pub use pipeline::{contacts_to_report, contacts_to_seeds, evaluate_friction, PulseProcessor};
pub use seeds::{compute_seeds, ContactSource, SeedScorer};
pub use store::{EngagementSession, FileStore, KeyValueStore, MemoryStore};
pub use streak::{EngagementState, EngagementStreakTracker};
pub use types::{
    ContactEngagementRecord, FrictionAlert, FrictionWindow, GardenTier, HealthTier, Importance,
    OutreachContext, SeedRecommendation,
};

// Schema exports
pub use schema::{ContactAdapter, RawContact, SCHEMA_VERSION};

/// Pulse version embedded in all reports
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "rapport-pulse";
