//! Adapter for converting rapport.contact.v1 payloads to ContactEngagementRecord
//!
//! Accepts either a JSON array of contacts or NDJSON (one contact per line).

use crate::error::PulseError;
use crate::schema::raw_contact::*;
use crate::types::ContactEngagementRecord;

/// Adapter for converting raw contact payloads to normalized records
pub struct ContactAdapter;

impl ContactAdapter {
    /// Parse a JSON string containing an array of RawContacts
    pub fn parse_array(json: &str) -> Result<Vec<RawContact>, PulseError> {
        let contacts: Vec<RawContact> = serde_json::from_str(json)?;
        Ok(contacts)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawContacts
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawContact>, PulseError> {
        let mut contacts = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawContact>(trimmed) {
                Ok(contact) => contacts.push(contact),
                Err(e) => {
                    return Err(PulseError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(contacts)
    }

    /// Parse either a JSON array or NDJSON, decided by the first non-blank character
    pub fn parse(input: &str) -> Result<Vec<RawContact>, PulseError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Normalize raw contacts, failing on the first invalid one
    pub fn to_records(contacts: &[RawContact]) -> Result<Vec<ContactEngagementRecord>, PulseError> {
        contacts
            .iter()
            .enumerate()
            .map(|(idx, contact)| {
                contact.to_record().map_err(|e| {
                    PulseError::ParseError(format!("Invalid contact at index {}: {}", idx, e))
                })
            })
            .collect()
    }

    /// Parse and normalize in one step
    pub fn parse_records(input: &str) -> Result<Vec<ContactEngagementRecord>, PulseError> {
        let contacts = Self::parse(input)?;
        Self::to_records(&contacts)
    }

    /// Validate a batch of contacts, returning only the failures
    pub fn validate_contacts(contacts: &[RawContact]) -> Vec<ValidationResult> {
        contacts
            .iter()
            .enumerate()
            .filter_map(|(idx, contact)| {
                contact.validate().err().map(|error| ValidationResult {
                    index: idx,
                    contact_id: contact.id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A contact that failed validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub contact_id: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Importance;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"id": "a", "name": "Ada", "last_contact_date": "2024-01-10", "importance": "high"},
            {"id": "b", "name": "Bo"}
        ]"#;

        let records = ContactAdapter::parse_records(json).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].importance, Importance::High);
        assert!(records[0].last_contact.is_some());
        assert_eq!(records[1].importance, Importance::Medium);
        assert_eq!(records[1].last_contact, None);
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = "{\"id\": \"a\"}\n\n{\"id\": \"b\", \"importance\": \"low\"}\n";

        let records = ContactAdapter::parse_records(ndjson).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].importance, Importance::Low);
    }

    #[test]
    fn test_ndjson_reports_line_number() {
        let ndjson = "{\"id\": \"a\"}\nnot json\n";

        let err = ContactAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_invalid_contact_is_rejected() {
        let json = r#"[{"id": "a"}, {"name": "no id"}]"#;

        let err = ContactAdapter::parse_records(json).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_validate_contacts() {
        let contacts = ContactAdapter::parse_array(
            r#"[{"id": "a"}, {"name": "x"}, {"id": "c", "target_frequency_days": -1}]"#,
        )
        .unwrap();

        let failures = ContactAdapter::validate_contacts(&contacts);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].error, ValidationError::MissingId);
        assert_eq!(failures[1].contact_id.as_deref(), Some("c"));
    }

    #[test]
    fn test_empty_input() {
        assert!(ContactAdapter::parse_records("").unwrap().is_empty());
        assert!(ContactAdapter::parse_records("[]").unwrap().is_empty());
    }
}
