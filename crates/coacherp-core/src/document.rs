//! Wire document codec
//!
//! The remote file holds one JSON object with up to four top-level keys:
//! `students`, `teamMembers`, `batches`, `profilePicture`. A document
//! missing a key is tolerated on pull - that key is treated as "no change".
//! Serialization of a full `AppState` always emits all four keys.
//!
//! Dates travel as ISO-8601 text and are revived into `DateTime<Utc>` by
//! the serde derives on the models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AppState, Student, TeamMember};
use crate::store::AppStore;

/// Errors raised while decoding the remote document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The remote file exists but has no content yet
    #[error("Document is empty")]
    Empty,

    /// The content is not valid JSON or not the expected shape
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// The remote document shape with every top-level key optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<Student>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_members: Option<Vec<TeamMember>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl StateDocument {
    /// Decode remote content
    ///
    /// Distinguishes an empty file (nothing to hydrate) from a malformed
    /// one (pull must abort without touching local state).
    pub fn parse(content: &str) -> Result<Self, DocumentError> {
        if content.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| DocumentError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(DocumentError::Malformed(
                "expected a top-level JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| DocumentError::Malformed(e.to_string()))
    }

    /// Apply this document to a store, key by key
    ///
    /// Keys absent from the document leave the corresponding local
    /// collection untouched.
    pub fn apply(self, store: &mut AppStore) {
        let mut state = store.snapshot();
        if let Some(students) = self.students {
            state.students = students;
        }
        if let Some(team_members) = self.team_members {
            state.team_members = team_members;
        }
        if let Some(batches) = self.batches {
            state.batches = batches;
        }
        if let Some(profile_picture) = self.profile_picture {
            state.profile_picture = profile_picture;
        }
        store.replace(state);
    }
}

/// Encode the full state for a push
///
/// Every push writes the complete document; there is no delta format.
pub fn serialize_state(state: &AppState) -> String {
    // AppState itself has no optional keys, so this always emits all four
    serde_json::to_string(state).expect("AppState serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payment, PaymentMode, StudentStatus};
    use chrono::{TimeZone, Utc};

    fn sample_state() -> AppState {
        AppState {
            students: vec![Student {
                id: "CE2024001".to_string(),
                name: "Aarav Sharma".to_string(),
                guardian_name: "Rajesh Sharma".to_string(),
                contact: "9876543210".to_string(),
                email: "aarav.sharma@email.com".to_string(),
                batch: "JEE Mains 2025".to_string(),
                enrollment_date: Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap(),
                status: StudentStatus::Active,
                total_fees: 120000.0,
                discount: 10000.0,
                payments: vec![Payment {
                    id: "PAY001".to_string(),
                    date: Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap(),
                    amount: 50000.0,
                    mode: PaymentMode::Upi,
                    reference_image: None,
                }],
            }],
            team_members: vec![TeamMember {
                id: "TM001".to_string(),
                name: "Ravi Kumar".to_string(),
                role: "Physics Faculty".to_string(),
            }],
            batches: vec!["JEE Mains 2025".to_string()],
            profile_picture: "https://picsum.photos/40/40".to_string(),
        }
    }

    #[test]
    fn test_roundtrip_restores_state() {
        let state = sample_state();
        let json = serialize_state(&state);

        let doc = StateDocument::parse(&json).unwrap();
        let mut store = AppStore::new();
        doc.apply(&mut store);

        assert_eq!(store.snapshot(), state);
    }

    #[test]
    fn test_roundtrip_with_zero_payments_and_no_image() {
        let mut state = sample_state();
        state.students[0].payments.clear();
        let json = serialize_state(&state);

        let doc = StateDocument::parse(&json).unwrap();
        let mut store = AppStore::new();
        doc.apply(&mut store);

        assert_eq!(store.snapshot(), state);
    }

    #[test]
    fn test_reserialization_is_byte_identical() {
        let json = serialize_state(&sample_state());

        let doc = StateDocument::parse(&json).unwrap();
        let mut store = AppStore::new();
        doc.apply(&mut store);

        assert_eq!(serialize_state(&store.snapshot()), json);
    }

    #[test]
    fn test_missing_key_leaves_collection_untouched() {
        let mut store = AppStore::new();
        store.add_team_member("Sunita Sharma", "Counselor");
        store.add_batch("NEET 2025");

        let doc = StateDocument::parse(r#"{"students":[]}"#).unwrap();
        doc.apply(&mut store);

        assert!(store.students().is_empty());
        assert_eq!(store.team_members().len(), 1);
        assert_eq!(store.batches(), &["NEET 2025".to_string()]);
    }

    #[test]
    fn test_empty_content_is_distinct_from_malformed() {
        assert!(matches!(StateDocument::parse(""), Err(DocumentError::Empty)));
        assert!(matches!(
            StateDocument::parse("   \n"),
            Err(DocumentError::Empty)
        ));
        assert!(matches!(
            StateDocument::parse("{not json"),
            Err(DocumentError::Malformed(_))
        ));
        assert!(matches!(
            StateDocument::parse("[1,2,3]"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_field_shape_is_malformed() {
        let err = StateDocument::parse(r#"{"students": "nope"}"#).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn test_dates_revive_from_iso8601() {
        let json = r#"{
            "students": [{
                "id": "CE2024001",
                "name": "Diya Patel",
                "guardianName": "Mitesh Patel",
                "contact": "9876543211",
                "email": "diya.patel@email.com",
                "batch": "NEET 2025",
                "enrollmentDate": "2024-05-01T00:00:00Z",
                "status": "Active",
                "totalFees": 150000.0,
                "discount": 0.0,
                "payments": [{
                    "id": "PAY003",
                    "date": "2024-05-01T00:00:00Z",
                    "amount": 75000.0,
                    "mode": "Cheque"
                }]
            }]
        }"#;

        let doc = StateDocument::parse(json).unwrap();
        let students = doc.students.unwrap();
        assert_eq!(
            students[0].enrollment_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            students[0].payments[0].date,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_serialize_always_emits_all_keys() {
        let json = serialize_state(&AppState::default());
        assert!(json.contains("\"students\""));
        assert!(json.contains("\"teamMembers\""));
        assert!(json.contains("\"batches\""));
        assert!(json.contains("\"profilePicture\""));
    }
}
