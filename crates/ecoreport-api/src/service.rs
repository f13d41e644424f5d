//! Submission and status-transition services.
//!
//! The services own the rules the HTTP layer must not: required-field
//! validation, coordinate coercion, the guest description marker, status
//! defaulting, and enum checking under the configured policy. Handlers stay
//! thin and the repository stays dumb.

use ecoreport_core::{
    guest_description, EnumPolicy, Error, NewReport, Report, ReportDraft, ReportPatch,
    ReportStatus, Result, Severity, SubmittedBy, TrashKind,
};
use serde::Serialize;

use crate::repository::ReportStore;

/// Accepts new reports from both identity paths.
#[derive(Clone)]
pub struct SubmissionService<S> {
    store: S,
    policy: EnumPolicy,
}

impl<S: ReportStore> SubmissionService<S> {
    pub fn new(store: S, policy: EnumPolicy) -> Self {
        Self { store, policy }
    }

    /// Validate and persist a new report.
    ///
    /// Guests get `user_id = None` and the textual guest marker appended to
    /// the description; authenticated callers get their id attached and the
    /// description passed through untouched.
    pub async fn submit(&self, draft: ReportDraft, submitted_by: SubmittedBy) -> Result<Report> {
        let photo_url = draft
            .photo_url
            .filter(|url| !url.is_empty())
            .ok_or_else(Error::missing_submission_fields)?;

        let (Some(lat), Some(lon)) = (draft.latitude, draft.longitude) else {
            return Err(Error::missing_submission_fields());
        };
        let latitude = lat.to_f64("latitude")?;
        let longitude = lon.to_f64("longitude")?;

        self.policy.check::<TrashKind>(draft.trash_type.as_deref())?;
        self.policy
            .check::<Severity>(draft.severity_level.as_deref())?;

        let status = match draft.status {
            Some(status) if !status.is_empty() => {
                self.policy.check::<ReportStatus>(Some(&status))?;
                status
            }
            _ => ReportStatus::default().as_str().to_string(),
        };

        let description = if submitted_by.is_guest() {
            Some(guest_description(draft.description))
        } else {
            draft.description
        };

        self.store
            .create(NewReport {
                user_id: submitted_by.user_id(),
                photo_url,
                latitude,
                longitude,
                description,
                trash_type: draft.trash_type,
                severity_level: draft.severity_level,
                status,
            })
            .await
    }
}

/// Mutates existing reports: status transitions and partial updates.
///
/// Any status may follow any other, including backwards; only membership in
/// the enum is checked (under the strict policy).
#[derive(Clone)]
pub struct StatusService<S> {
    store: S,
    policy: EnumPolicy,
}

impl<S: ReportStore> StatusService<S> {
    pub fn new(store: S, policy: EnumPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn change_status(&self, id: i64, status: &str) -> Result<()> {
        if status.is_empty() {
            return Err(Error::Validation("Status is required".to_string()));
        }
        self.policy.check::<ReportStatus>(Some(status))?;

        if self.store.update_status(id, status).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Trash report {id}")))
        }
    }

    pub async fn apply_patch(&self, id: i64, patch: ReportPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(Error::Validation("No fields to update".to_string()));
        }

        // Explicit nulls clear a field and carry nothing to validate.
        self.policy.check::<ReportStatus>(patch.status.as_deref())?;
        self.policy
            .check::<TrashKind>(patch.trash_type.as_ref().and_then(|v| v.as_deref()))?;
        self.policy
            .check::<Severity>(patch.severity_level.as_ref().and_then(|v| v.as_deref()))?;

        if self.store.update_partial(id, &patch).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Trash report {id}")))
        }
    }
}

/// Aggregate counts shown on the public site. Resolved means cleaned or
/// verified; pending means still only reported.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportStats {
    #[serde(rename = "totalReports")]
    pub total: usize,
    #[serde(rename = "pendingReports")]
    pub pending: usize,
    #[serde(rename = "inProgressReports")]
    pub in_progress: usize,
    #[serde(rename = "resolvedReports")]
    pub resolved: usize,
}

pub fn aggregate_stats(reports: &[Report]) -> ReportStats {
    ReportStats {
        total: reports.len(),
        pending: reports.iter().filter(|r| r.status == "REPORTED").count(),
        in_progress: reports
            .iter()
            .filter(|r| r.status == "IN_PROGRESS")
            .count(),
        resolved: reports
            .iter()
            .filter(|r| r.status == "CLEANED" || r.status == "VERIFIED")
            .count(),
    }
}
