//! HTTP request handlers.
//!
//! Every handler catches its errors locally and maps them onto a status
//! code plus a JSON `{"error": message}` body; nothing propagates
//! unhandled. Internal faults log their detail and return a generic
//! message to the caller.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ecoreport_core::{Error, ReportDraft, ReportPatch, SubmittedBy, User, WireReport, ROLE_USER};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::auth::{self, Identity};
use crate::repository::{NewUser, ReportStore, UserStore};
use crate::service::aggregate_stats;
use crate::upload::{self, UPLOAD_FIELD};
use crate::AppState;

/// API error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Validation(_) | Error::Upload(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {err}");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        ApiError { status, message }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "ecoreport-api"
    }))
}

/// Home route
pub async fn root_handler() -> &'static str {
    "ecoreport API is running"
}

/// Create a new trash report. A valid bearer token attaches the caller's
/// user id; everyone else submits as guest.
pub async fn create_report_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(draft): Json<ReportDraft>,
) -> Result<(StatusCode, Json<WireReport>), ApiError> {
    let submitted_by = identity.submitted_by();
    info!("Creating report (guest: {})", submitted_by.user_id().is_none());

    let report = state.submissions.submit(draft, submitted_by).await?;

    Ok((StatusCode::CREATED, Json(report.into())))
}

/// Create a report on the explicit guest path, ignoring any token.
pub async fn create_guest_report_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ReportDraft>,
) -> Result<(StatusCode, Json<WireReport>), ApiError> {
    let report = state.submissions.submit(draft, SubmittedBy::Guest).await?;

    Ok((StatusCode::CREATED, Json(report.into())))
}

/// Get all trash reports, newest first
pub async fn list_reports_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WireReport>>, ApiError> {
    let reports = state.reports.get_all().await?;

    Ok(Json(reports.into_iter().map(WireReport::from).collect()))
}

/// Aggregate counts for the public site
pub async fn report_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state.reports.get_all().await?;

    Ok(Json(aggregate_stats(&reports)))
}

/// Get a specific trash report by ID
pub async fn get_report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<WireReport>, ApiError> {
    match state.reports.get_by_id(id).await? {
        Some(report) => Ok(Json(report.into())),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: "Trash report not found".to_string(),
        }),
    }
}

/// Partial update of a report. A status-only patch goes through the
/// transition service; anything broader through the general patch path.
pub async fn update_report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<ReportPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status_only = ReportPatch {
        status: patch.status.clone(),
        ..Default::default()
    };

    if patch.status.is_some() && patch == status_only {
        let status = patch.status.as_deref().unwrap_or_default();
        state.statuses.change_status(id, status).await?;
        return Ok(Json(json!({ "message": "Status updated successfully" })));
    }

    state.statuses.apply_patch(id, patch).await?;

    Ok(Json(json!({
        "message": "Trash report updated successfully"
    })))
}

/// Delete a trash report
pub async fn delete_report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.reports.delete(id).await? {
        Ok(Json(json!({
            "message": "Trash report deleted successfully"
        })))
    } else {
        Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: "Trash report not found".to_string(),
        })
    }
}

/// Get trash reports submitted by one user
pub async fn reports_by_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<WireReport>>, ApiError> {
    let reports = state.reports.get_by_user(user_id).await?;

    Ok(Json(reports.into_iter().map(WireReport::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Account fields exposed to clients; the password hash never leaves.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            is_admin: user.is_admin(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

/// Register a new user
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(Error::Validation("All fields are required".to_string()).into());
    }

    if payload.password.len() < 6 {
        return Err(Error::Validation(
            "Password must be at least 6 characters long".to_string(),
        )
        .into());
    }

    let password = auth::hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password,
            role: ROLE_USER.to_string(),
        })
        .await?;

    let token = auth::issue_token(&user, &state.config.jwt_secret)?;

    info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(&user),
            token,
        }),
    ))
}

/// Login and issue a 24h bearer token
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(Error::Validation("Username and password are required".to_string()).into());
    }

    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(|| Error::Auth("Invalid credentials".to_string()))?;

    if !auth::verify_password(&payload.password, &user.password) {
        return Err(Error::Auth("Invalid credentials".to_string()).into());
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret)?;

    // Best-effort last-login touch; failures are logged, never surfaced.
    let users = state.users.clone();
    let user_id = user.id;
    tokio::spawn(async move {
        if let Err(e) = users.touch_last_login(user_id).await {
            error!("Failed to update last login time: {e}");
        }
    });

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserResponse::from(&user),
        token,
    }))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub filename: String,
    pub message: String,
}

/// Accept a single multipart image under the `image` field and store it
/// under a generated filename.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Upload(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Upload(format!("Failed to read upload: {e}")))?;

        let stored = upload::store_image(
            &state.config.uploads_dir,
            original_name.as_deref(),
            content_type.as_deref(),
            &data,
        )
        .await?;

        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");

        return Ok(Json(UploadResponse {
            success: true,
            image_url: upload::public_url(scheme, host, &stored.filename),
            filename: stored.filename,
            message: "File uploaded successfully".to_string(),
        }));
    }

    Err(Error::Upload("No file uploaded".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_faults_return_a_generic_body() {
        let err = ApiError::from(Error::Other(anyhow::anyhow!("signing key exploded")));

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn auth_failures_stay_unauthorized() {
        let err = ApiError::from(Error::Auth("Invalid credentials".to_string()));

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid credentials");
    }
}
