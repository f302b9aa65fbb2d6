//! Client-local persistence for engagement state
//!
//! The engagement record lives in a key-value store owned by the host app. This
//! module defines that seam, two implementations (in-memory and one-file-per-key),
//! and [`EngagementSession`], which loads the record once and writes it back after
//! every mutation.
//!
//! A session assumes it is the only writer for its key. Concurrent sessions over the
//! same store (e.g. two devices syncing one directory) will overwrite each other.

use crate::config::LEVEL_THRESHOLDS;
use crate::error::PulseError;
use crate::streak::{EngagementState, EngagementStreakTracker, StreakUpdate};
use chrono::{DateTime, TimeZone};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Namespace key the engagement record is stored under
pub const ENGAGEMENT_STATE_KEY: &str = "rapport.engagement_state.v1";

/// String-valued key-value store supplied by the host
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PulseError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PulseError>;
}

/// Volatile store, mainly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PulseError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PulseError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store that keeps each key in `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PulseError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PulseError::Store(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PulseError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PulseError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves a truncated record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Engagement tracker bound to the store it persists into
pub struct EngagementSession<S: KeyValueStore> {
    store: S,
    tracker: EngagementStreakTracker,
}

impl<S: KeyValueStore> EngagementSession<S> {
    /// Load the engagement record, creating a zeroed one if none is stored
    pub fn open(store: S) -> Result<Self, PulseError> {
        Self::open_with_thresholds(store, LEVEL_THRESHOLDS.to_vec())
    }

    /// [`EngagementSession::open`] with a custom level table
    pub fn open_with_thresholds(store: S, thresholds: Vec<u64>) -> Result<Self, PulseError> {
        let state = match store.get(ENGAGEMENT_STATE_KEY)? {
            Some(json) => serde_json::from_str::<EngagementState>(&json)?,
            None => {
                tracing::debug!("no stored engagement state, starting fresh");
                EngagementState::default()
            }
        };

        Ok(Self {
            store,
            tracker: EngagementStreakTracker::with_thresholds(state, thresholds),
        })
    }

    pub fn state(&self) -> &EngagementState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &EngagementStreakTracker {
        &self.tracker
    }

    /// Release the underlying store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Record an engagement against the local clock and persist
    pub fn record_engagement(&mut self, mode: &str, score: u64) -> Result<StreakUpdate, PulseError> {
        let update = self.tracker.record_engagement(mode, score);
        self.save()?;
        Ok(update)
    }

    /// Record an engagement at `now` and persist
    pub fn record_engagement_at<Tz: TimeZone>(
        &mut self,
        mode: &str,
        score: u64,
        now: DateTime<Tz>,
    ) -> Result<StreakUpdate, PulseError> {
        let update = self.tracker.record_engagement_at(mode, score, now);
        self.save()?;
        Ok(update)
    }

    /// Grant XP outside of a recorded engagement and persist
    pub fn add_xp(&mut self, xp: u64) -> Result<u32, PulseError> {
        let level = self.tracker.add_xp(xp);
        self.save()?;
        Ok(level)
    }

    /// Write the current record back to the store
    pub fn save(&mut self) -> Result<(), PulseError> {
        let json = self.tracker.to_json()?;
        self.store.set(ENGAGEMENT_STATE_KEY, &json)
    }
}
