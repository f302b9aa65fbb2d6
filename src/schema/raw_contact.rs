//! rapport.contact.v1 schema definition
//!
//! A permissive contact shape that tolerates the field variants produced by the
//! different upstream query layers:
//! - three candidate "last contact" timestamps
//! - importance as free text
//! - camelCase or snake_case keys

use crate::types::{ContactEngagementRecord, Importance, DEFAULT_TARGET_FREQUENCY_DAYS};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "rapport.contact.v1";

/// Contact record as delivered by an upstream collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
    #[serde(default, alias = "contact_id", alias = "contactId")]
    pub id: Option<String>,

    #[serde(default, alias = "display_name", alias = "displayName", alias = "full_name")]
    pub name: Option<String>,

    #[serde(default, alias = "lastContactDate", skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<String>,

    #[serde(default, alias = "lastContactedAt", skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<String>,

    #[serde(default, alias = "lastInteractionAt", skip_serializing_if = "Option::is_none")]
    pub last_interaction_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,

    #[serde(default, alias = "targetFrequencyDays", skip_serializing_if = "Option::is_none")]
    pub target_frequency_days: Option<i64>,
}

impl RawContact {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// First populated date field that parses, in priority order.
    ///
    /// Unparseable values are skipped (and logged) rather than rejected.
    pub fn resolve_last_contact(&self) -> Option<DateTime<Utc>> {
        [
            &self.last_contact_date,
            &self.last_contacted_at,
            &self.last_interaction_at,
        ]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .find_map(|raw| {
            let parsed = parse_contact_date(raw);
            if parsed.is_none() {
                tracing::warn!(
                    contact = self.id.as_deref().unwrap_or("unknown"),
                    value = raw,
                    "ignoring unparseable contact date"
                );
            }
            parsed
        })
    }

    /// Importance label, medium when absent or unrecognized
    pub fn resolve_importance(&self) -> Importance {
        self.importance
            .as_deref()
            .and_then(Importance::parse_lenient)
            .unwrap_or_default()
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => return Err(ValidationError::MissingId),
            Some(_) => {}
        }

        if let Some(days) = self.target_frequency_days {
            if days < 0 {
                return Err(ValidationError::NegativeTargetFrequency(days));
            }
            if days > i64::from(u32::MAX) {
                return Err(ValidationError::TargetFrequencyOutOfRange(days));
            }
        }

        Ok(())
    }

    /// Resolve into the normalized record, applying defaults
    pub fn to_record(&self) -> Result<ContactEngagementRecord, ValidationError> {
        self.validate()?;

        let id = self.id.as_deref().unwrap_or_default().trim().to_string();
        let target_frequency_days = match self.target_frequency_days {
            Some(days) if days > 0 => days as u32,
            _ => DEFAULT_TARGET_FREQUENCY_DAYS,
        };

        Ok(ContactEngagementRecord {
            name: self.name.clone().unwrap_or_else(|| id.clone()),
            id,
            last_contact: self.resolve_last_contact(),
            importance: self.resolve_importance(),
            target_frequency_days,
        })
    }
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or
/// a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_contact_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Validation errors for raw contacts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Contact is missing an id")]
    MissingId,

    #[error("Target frequency must not be negative, got {0}")]
    NegativeTargetFrequency(i64),

    #[error("Target frequency out of range: {0}")]
    TargetFrequencyOutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();

        assert_eq!(parse_contact_date("2024-01-15T14:30:00Z"), Some(expected));
        assert_eq!(parse_contact_date("2024-01-15T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_contact_date("2024-01-15T14:30:00"), Some(expected));
        assert_eq!(parse_contact_date("2024-01-15 14:30:00.000"), Some(expected));
        assert_eq!(
            parse_contact_date("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_contact_date("last tuesday"), None);
    }

    #[test]
    fn test_date_field_priority() {
        let contact = RawContact {
            last_contact_date: Some("2024-03-01".to_string()),
            last_interaction_at: Some("2024-02-01".to_string()),
            ..RawContact::new("c1")
        };

        assert_eq!(
            contact.resolve_last_contact(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_date_falls_through() {
        let contact = RawContact {
            last_contact_date: Some("garbage".to_string()),
            last_contacted_at: Some("   ".to_string()),
            last_interaction_at: Some("2024-02-01".to_string()),
            ..RawContact::new("c1")
        };

        assert_eq!(
            contact.resolve_last_contact(),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_only_unparseable_dates_mean_never_contacted() {
        let contact = RawContact {
            last_contacted_at: Some("soon".to_string()),
            ..RawContact::new("c1")
        };

        assert_eq!(contact.resolve_last_contact(), None);
    }

    #[test]
    fn test_camel_case_aliases() {
        let json = r#"{"contactId": "c9", "displayName": "Ana", "lastContactedAt": "2024-04-04", "importance": "HIGH", "targetFrequencyDays": 7}"#;
        let record = serde_json::from_str::<RawContact>(json).unwrap().to_record().unwrap();

        assert_eq!(record.id, "c9");
        assert_eq!(record.name, "Ana");
        assert_eq!(record.importance, Importance::High);
        assert_eq!(record.target_frequency_days, 7);
        assert!(record.last_contact.is_some());
    }

    #[test]
    fn test_defaults_applied() {
        let raw = RawContact {
            importance: Some("urgent".to_string()),
            target_frequency_days: Some(0),
            ..RawContact::new("c2")
        };
        let record = raw.to_record().unwrap();

        assert_eq!(record.importance, Importance::Medium);
        assert_eq!(record.target_frequency_days, 30);
        assert_eq!(record.name, "c2");
        assert_eq!(record.last_contact, None);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(RawContact::default().validate(), Err(ValidationError::MissingId));
        assert_eq!(RawContact::new("  ").validate(), Err(ValidationError::MissingId));

        let negative = RawContact {
            target_frequency_days: Some(-5),
            ..RawContact::new("c3")
        };
        assert_eq!(
            negative.validate(),
            Err(ValidationError::NegativeTargetFrequency(-5))
        );
    }
}
