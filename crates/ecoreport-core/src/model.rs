//! Canonical report entity and its enumerated fields.
//!
//! Everything downstream of the wire boundary works with these types and
//! one casing only; the dual-casing translation lives in [`crate::wire`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Textual suffix appended to guest submissions. Display-only annotation;
/// the source of truth for guest detection is [`SubmittedBy`].
pub const GUEST_MARKER: &str = "[Reported by Guest]";

/// Lifecycle status of a report. Callers only ever move forward
/// (REPORTED -> IN_PROGRESS -> CLEANED -> VERIFIED) but arbitrary jumps
/// are accepted when requested directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Reported,
    InProgress,
    Cleaned,
    Verified,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Reported => "REPORTED",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Cleaned => "CLEANED",
            ReportStatus::Verified => "VERIFIED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "REPORTED" => Ok(ReportStatus::Reported),
            "IN_PROGRESS" => Ok(ReportStatus::InProgress),
            "CLEANED" => Ok(ReportStatus::Cleaned),
            "VERIFIED" => Ok(ReportStatus::Verified),
            other => Err(Error::Validation(format!("Unknown status: {other}"))),
        }
    }
}

/// Category of the reported litter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrashKind {
    Plastic,
    Food,
    Hazardous,
    Paper,
    Electronics,
    Mixed,
}

impl FromStr for TrashKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PLASTIC" => Ok(TrashKind::Plastic),
            "FOOD" => Ok(TrashKind::Food),
            "HAZARDOUS" => Ok(TrashKind::Hazardous),
            "PAPER" => Ok(TrashKind::Paper),
            "ELECTRONICS" => Ok(TrashKind::Electronics),
            "MIXED" => Ok(TrashKind::Mixed),
            other => Err(Error::Validation(format!("Unknown trash type: {other}"))),
        }
    }
}

/// How urgent a cleanup is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            other => Err(Error::Validation(format!("Unknown severity level: {other}"))),
        }
    }
}

/// Whether enumerated fields are validated at the boundary.
///
/// The historical stores hold whatever string callers sent, so `Lenient`
/// preserves compatibility with old rows; `Strict` is the default for new
/// writes and rejects unrecognized values with a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPolicy {
    #[default]
    Strict,
    Lenient,
}

impl EnumPolicy {
    /// Check an optional enumerated string against `parse`. `None` and, under
    /// `Lenient`, unrecognized values pass through untouched.
    pub fn check<T: FromStr<Err = Error>>(&self, value: Option<&str>) -> Result<()> {
        if let (EnumPolicy::Strict, Some(v)) = (self, value) {
            v.parse::<T>()?;
        }
        Ok(())
    }
}

/// Who submitted a report. Replaces the legacy pair of detection paths
/// (description marker vs. null user id) with an explicit tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmittedBy {
    Authenticated(i64),
    Guest,
}

impl SubmittedBy {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            SubmittedBy::Authenticated(id) => Some(*id),
            SubmittedBy::Guest => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, SubmittedBy::Guest)
    }
}

/// Append the guest marker to a description, or produce the bare marker
/// when no description was given.
pub fn guest_description(description: Option<String>) -> String {
    match description {
        Some(text) if !text.is_empty() => format!("{text} {GUEST_MARKER}"),
        _ => GUEST_MARKER.to_string(),
    }
}

/// A stored report. `status`, `trash_type` and `severity_level` stay plain
/// strings here because lenient stores may hold out-of-enum values; the
/// typed enums guard the write boundary instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub user_id: Option<i64>,
    pub photo_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub trash_type: Option<String>,
    pub severity_level: Option<String>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A report ready for insertion; `id` and timestamps are assigned by the
/// store. Built from a wire draft by the submission service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub user_id: Option<i64>,
    pub photo_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub trash_type: Option<String>,
    pub severity_level: Option<String>,
    pub status: String,
}

/// A registered account. Authorization decisions key off `role`; everything
/// else about auth mechanics lives in the API crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}
