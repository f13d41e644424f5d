//! ecoreport REST API
//!
//! HTTP backend for the crowdsourced litter-reporting system: report
//! submission (authenticated or guest), listing and lifecycle updates,
//! account registration/login, and image uploads.
//!
//! ## Endpoints
//!
//! - `POST /api/reports` - Submit a report (bearer token optional)
//! - `POST /api/reports/guest` - Submit explicitly as guest
//! - `GET /api/reports` - All reports, newest first
//! - `GET /api/reports/stats` - Aggregate status counts
//! - `GET /api/reports/{id}` - One report
//! - `PUT /api/reports/{id}` / `PATCH /api/reports/{id}` - Partial update
//! - `DELETE /api/reports/{id}` - Remove a report
//! - `GET /api/reports/user/{user_id}` - One user's reports
//! - `POST /api/auth/register` / `POST /api/auth/login` - Accounts
//! - `POST /api/upload` - Multipart image upload
//! - `GET /uploads/{file}` - Stored images
//! - `GET /health` - Health check

pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;
pub mod repository;
pub mod service;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
use repository::{SqliteReportStore, SqliteUserStore};
use service::{StatusService, SubmissionService};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub submissions: SubmissionService<SqliteReportStore>,
    pub statuses: StatusService<SqliteReportStore>,
    pub reports: SqliteReportStore,
    pub users: SqliteUserStore,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let reports = SqliteReportStore::new(pool.clone());
        Self {
            submissions: SubmissionService::new(reports.clone(), config.enum_policy),
            statuses: StatusService::new(reports.clone(), config.enum_policy),
            reports,
            users: SqliteUserStore::new(pool),
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let uploads_dir = state.config.uploads_dir.clone();
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        // Reports
        .route("/api/reports", post(handlers::create_report_handler))
        .route("/api/reports", get(handlers::list_reports_handler))
        .route(
            "/api/reports/guest",
            post(handlers::create_guest_report_handler),
        )
        .route("/api/reports/stats", get(handlers::report_stats_handler))
        .route("/api/reports/{id}", get(handlers::get_report_handler))
        .route("/api/reports/{id}", put(handlers::update_report_handler))
        .route(
            "/api/reports/{id}",
            patch(handlers::update_report_handler),
        )
        .route(
            "/api/reports/{id}",
            delete(handlers::delete_report_handler),
        )
        .route(
            "/api/reports/user/{user_id}",
            get(handlers::reports_by_user_handler),
        )
        // Accounts
        .route("/api/auth/register", post(handlers::register_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        // Uploads: multipart in, static files out
        .route(
            "/api/upload",
            post(handlers::upload_handler)
                .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
