//! Dual-casing wire adapter.
//!
//! Three generations of clients disagree on key casing: the mobile app
//! submits camelCase, older API consumers read snake_case, and the upload
//! flow speaks `imageUrl`. Rather than picking a winner, outgoing payloads
//! answer in every dialect (each alias pair carries identical values) and
//! incoming payloads are accepted in either casing. Internal code uses the
//! canonical [`Report`] shape only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Report;

/// A latitude/longitude value as clients actually send it: a JSON number
/// or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// Coerce to floating point. A present but unparseable value fails the
    /// whole operation with a validation error.
    pub fn to_f64(&self, field: &str) -> Result<f64> {
        match self {
            Coordinate::Number(n) => Ok(*n),
            Coordinate::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::Validation(format!("{field} must be a number"))),
        }
    }
}

/// Incoming report payload, already merged down to one casing.
///
/// Deserialization goes through [`RawDraft`] so that a payload carrying both
/// casings of the same field still parses; the explicitly camelCased key
/// wins, then the snake_case spelling, then the legacy alias.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawDraft")]
pub struct ReportDraft {
    pub photo_url: Option<String>,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub description: Option<String>,
    pub trash_type: Option<String>,
    pub severity_level: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDraft {
    #[serde(rename = "photoUrl")]
    photo_url_camel: Option<String>,
    photo_url: Option<String>,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    latitude: Option<Coordinate>,
    longitude: Option<Coordinate>,
    description: Option<String>,
    #[serde(rename = "trashType")]
    trash_type_camel: Option<String>,
    trash_type: Option<String>,
    #[serde(rename = "severityLevel")]
    severity_level_camel: Option<String>,
    severity_level: Option<String>,
    status: Option<String>,
}

impl From<RawDraft> for ReportDraft {
    fn from(raw: RawDraft) -> Self {
        ReportDraft {
            photo_url: raw.photo_url_camel.or(raw.photo_url).or(raw.image_url),
            latitude: raw.latitude,
            longitude: raw.longitude,
            description: raw.description,
            trash_type: raw.trash_type_camel.or(raw.trash_type),
            severity_level: raw.severity_level_camel.or(raw.severity_level),
            status: raw.status,
        }
    }
}

/// Partial update of a stored report.
///
/// Nullable fields are tri-state: outer `None` means "key not provided",
/// `Some(None)` means the caller sent an explicit JSON null (clear the
/// stored value), `Some(Some(v))` sets it. `status` cannot be cleared, so
/// a null status reads as not provided.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawPatch")]
pub struct ReportPatch {
    pub status: Option<String>,
    pub description: Option<Option<String>>,
    pub trash_type: Option<Option<String>>,
    pub severity_level: Option<Option<String>>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.description.is_none()
            && self.trash_type.is_none()
            && self.severity_level.is_none()
    }
}

/// Keeps "key absent" apart from "key: null": the field default stays
/// `None`, while a present key (null included) lands in `Some`.
fn provided<'de, D>(de: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPatch {
    status: Option<String>,
    #[serde(deserialize_with = "provided")]
    description: Option<Option<String>>,
    #[serde(rename = "trashType", deserialize_with = "provided")]
    trash_type_camel: Option<Option<String>>,
    #[serde(deserialize_with = "provided")]
    trash_type: Option<Option<String>>,
    #[serde(rename = "severityLevel", deserialize_with = "provided")]
    severity_level_camel: Option<Option<String>>,
    #[serde(deserialize_with = "provided")]
    severity_level: Option<Option<String>>,
}

impl From<RawPatch> for ReportPatch {
    fn from(raw: RawPatch) -> Self {
        ReportPatch {
            status: raw.status,
            description: raw.description,
            trash_type: raw.trash_type_camel.or(raw.trash_type),
            severity_level: raw.severity_level_camel.or(raw.severity_level),
        }
    }
}

/// Outgoing report payload. Every alias pair serializes with identical
/// values so each client generation finds the key it expects.
#[derive(Debug, Clone, Serialize)]
pub struct WireReport {
    pub id: i64,
    pub user_id: Option<i64>,
    #[serde(rename = "userId")]
    pub user_id_camel: Option<i64>,
    pub photo_url: String,
    #[serde(rename = "photoUrl")]
    pub photo_url_camel: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub trash_type: Option<String>,
    #[serde(rename = "trashType")]
    pub trash_type_camel: Option<String>,
    pub severity_level: Option<String>,
    #[serde(rename = "severityLevel")]
    pub severity_level_camel: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at_camel: Option<String>,
    pub updated_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at_camel: Option<String>,
}

/// Absent timestamps serialize as null rather than erroring.
fn iso8601(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

impl From<Report> for WireReport {
    fn from(report: Report) -> Self {
        let created = iso8601(report.created_at);
        let updated = iso8601(report.updated_at);
        WireReport {
            id: report.id,
            user_id: report.user_id,
            user_id_camel: report.user_id,
            photo_url: report.photo_url.clone(),
            photo_url_camel: report.photo_url.clone(),
            image_url: report.photo_url,
            latitude: report.latitude,
            longitude: report.longitude,
            description: report.description,
            trash_type: report.trash_type.clone(),
            trash_type_camel: report.trash_type,
            severity_level: report.severity_level.clone(),
            severity_level_camel: report.severity_level,
            status: report.status,
            created_at: created.clone(),
            created_at_camel: created,
            updated_at: updated.clone(),
            updated_at_camel: updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_report() -> Report {
        Report {
            id: 3,
            user_id: Some(11),
            photo_url: "http://x/a.jpg".to_string(),
            latitude: 42.5,
            longitude: 23.3,
            description: Some("pile near bridge".to_string()),
            trash_type: Some("PLASTIC".to_string()),
            severity_level: Some("HIGH".to_string()),
            status: "REPORTED".to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            updated_at: None,
        }
    }

    #[test]
    fn wire_report_answers_in_every_dialect() {
        let wire = WireReport::from(sample_report());
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value["photo_url"], value["photoUrl"]);
        assert_eq!(value["photo_url"], value["imageUrl"]);
        assert_eq!(value["created_at"], value["createdAt"]);
        assert_eq!(value["trash_type"], value["trashType"]);
        assert_eq!(value["severity_level"], value["severityLevel"]);
        assert_eq!(value["user_id"], value["userId"]);
        assert_eq!(value["photo_url"], "http://x/a.jpg");
    }

    #[test]
    fn missing_timestamp_serializes_as_null() {
        let mut report = sample_report();
        report.created_at = None;
        let value = serde_json::to_value(WireReport::from(report)).unwrap();
        assert!(value["created_at"].is_null());
        assert!(value["createdAt"].is_null());
    }

    #[test]
    fn draft_accepts_camel_case() {
        let draft: ReportDraft = serde_json::from_value(json!({
            "photoUrl": "http://x/a.jpg",
            "latitude": 42.5,
            "longitude": "23.3",
            "trashType": "PLASTIC"
        }))
        .unwrap();

        assert_eq!(draft.photo_url.as_deref(), Some("http://x/a.jpg"));
        assert_eq!(draft.trash_type.as_deref(), Some("PLASTIC"));
        assert_eq!(draft.latitude.unwrap().to_f64("latitude").unwrap(), 42.5);
        assert_eq!(draft.longitude.unwrap().to_f64("longitude").unwrap(), 23.3);
    }

    #[test]
    fn draft_accepts_snake_case_and_legacy_alias() {
        let draft: ReportDraft = serde_json::from_value(json!({
            "photo_url": "http://x/b.jpg",
            "severity_level": "LOW"
        }))
        .unwrap();
        assert_eq!(draft.photo_url.as_deref(), Some("http://x/b.jpg"));
        assert_eq!(draft.severity_level.as_deref(), Some("LOW"));

        let legacy: ReportDraft = serde_json::from_value(json!({
            "imageUrl": "http://x/c.jpg"
        }))
        .unwrap();
        assert_eq!(legacy.photo_url.as_deref(), Some("http://x/c.jpg"));
    }

    #[test]
    fn explicit_key_wins_over_alternate_casing() {
        let draft: ReportDraft = serde_json::from_value(json!({
            "photoUrl": "http://x/camel.jpg",
            "photo_url": "http://x/snake.jpg",
            "imageUrl": "http://x/legacy.jpg"
        }))
        .unwrap();
        assert_eq!(draft.photo_url.as_deref(), Some("http://x/camel.jpg"));
    }

    #[test]
    fn unparseable_coordinate_is_a_validation_error() {
        let coord = Coordinate::Text("abc".to_string());
        let err = coord.to_f64("latitude").unwrap_err();
        assert!(err.to_string().contains("latitude must be a number"));
    }

    #[test]
    fn patch_merges_casings_and_reports_emptiness() {
        let patch: ReportPatch = serde_json::from_value(json!({
            "severityLevel": "MEDIUM"
        }))
        .unwrap();
        assert_eq!(patch.severity_level, Some(Some("MEDIUM".to_string())));
        assert!(!patch.is_empty());

        let empty: ReportPatch = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: ReportPatch = serde_json::from_value(json!({
            "status": "CLEANED",
            "description": null
        }))
        .unwrap();
        assert_eq!(patch.status.as_deref(), Some("CLEANED"));
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.trash_type, None);

        let without_null: ReportPatch = serde_json::from_value(json!({
            "status": "CLEANED"
        }))
        .unwrap();
        assert_ne!(patch, without_null);

        // A lone null still counts as a provided field.
        let clear_only: ReportPatch =
            serde_json::from_value(json!({ "description": null })).unwrap();
        assert!(!clear_only.is_empty());
    }
}
