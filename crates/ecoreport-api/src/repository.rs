//! Persistence contract and its SQLite implementation.
//!
//! Every write is a single statement; row-matched updates report `true`
//! when a row changed and `false` when the id did not exist, so callers
//! can map misses to 404 without a second query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoreport_core::{Error, NewReport, Report, ReportPatch, Result, User};
use sqlx::{FromRow, QueryBuilder, SqlitePool};
use tracing::debug;

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

/// Operations any report persistence backend must support.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a report, assigning `id` and `created_at`.
    async fn create(&self, report: NewReport) -> Result<Report>;

    /// All reports, newest first. Empty store yields an empty vec.
    async fn get_all(&self) -> Result<Vec<Report>>;

    /// `None` is the not-found sentinel; callers check it explicitly.
    async fn get_by_id(&self, id: i64) -> Result<Option<Report>>;

    /// Reports for one user, newest first.
    async fn get_by_user(&self, user_id: i64) -> Result<Vec<Report>>;

    /// Status-only update. No enum validation at this layer.
    async fn update_status(&self, id: i64, status: &str) -> Result<bool>;

    /// Apply only the provided fields; an explicit null clears the column
    /// and an empty patch returns `false` without touching the store.
    async fn update_partial(&self, id: i64, patch: &ReportPatch) -> Result<bool>;

    /// Remove the row entirely; no tombstone.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: i64,
    user_id: Option<i64>,
    photo_url: String,
    latitude: f64,
    longitude: f64,
    description: Option<String>,
    trash_type: Option<String>,
    severity_level: Option<String>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            user_id: row.user_id,
            photo_url: row.photo_url,
            latitude: row.latitude,
            longitude: row.longitude,
            description: row.description,
            trash_type: row.trash_type,
            severity_level: row.severity_level,
            // Rows predating the status column read as freshly reported.
            status: row.status.unwrap_or_else(|| "REPORTED".to_string()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SQLite-backed report store.
#[derive(Clone)]
pub struct SqliteReportStore {
    pool: SqlitePool,
}

impl SqliteReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn create(&self, report: NewReport) -> Result<Report> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO trash_reports
                (user_id, photo_url, latitude, longitude, description,
                 trash_type, severity_level, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(report.user_id)
        .bind(&report.photo_url)
        .bind(report.latitude)
        .bind(report.longitude)
        .bind(&report.description)
        .bind(&report.trash_type)
        .bind(&report.severity_level)
        .bind(&report.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        debug!("Created report {}", row.id);
        Ok(row.into())
    }

    async fn get_all(&self) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT * FROM trash_reports
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Report::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query_as::<_, ReportRow>("SELECT * FROM trash_reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Report::from))
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Vec<Report>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT * FROM trash_reports
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Report::from).collect())
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<bool> {
        let rows = sqlx::query(
            "UPDATE trash_reports SET status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn update_partial(&self, id: i64, patch: &ReportPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE trash_reports SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(status) = &patch.status {
            query.push(", status = ").push_bind(status);
        }
        // Provided-as-null fields bind NULL and clear the column.
        if let Some(description) = &patch.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(trash_type) = &patch.trash_type {
            query.push(", trash_type = ").push_bind(trash_type);
        }
        if let Some(severity_level) = &patch.severity_level {
            query.push(", severity_level = ").push_bind(severity_level);
        }

        query.push(" WHERE id = ").push_bind(id);

        let rows = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM trash_reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();

        if rows > 0 {
            debug!("Deleted report {}", id);
        }

        Ok(rows > 0)
    }
}

/// A user record ready for insertion; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Operations the account persistence backend must support.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate username/email surfaces as a conflict.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Best-effort last-login touch; callers fire and forget this.
    async fn touch_last_login(&self, id: i64) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    created_at: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            role: row.role,
            created_at: row.created_at,
            last_login: row.last_login,
        }
    }
}

/// SQLite-backed user store.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let message = db.message().to_string();
                if message.contains("users.username") {
                    Error::Conflict("Username already exists".to_string())
                } else if message.contains("users.email") {
                    Error::Conflict("Email already exists".to_string())
                } else {
                    Error::Conflict("User already exists".to_string())
                }
            }
            _ => db_err(e),
        })?;

        debug!("Created user {} ({})", row.id, row.username);
        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(User::from))
    }

    async fn touch_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn sample_new_report(photo: &str) -> NewReport {
        NewReport {
            user_id: None,
            photo_url: photo.to_string(),
            latitude: 42.5,
            longitude: 23.3,
            description: Some("pile near bridge".to_string()),
            trash_type: Some("PLASTIC".to_string()),
            severity_level: Some("HIGH".to_string()),
            status: "REPORTED".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_created_at() {
        let store = SqliteReportStore::new(test_pool().await);

        let report = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        assert!(report.id > 0);
        assert!(report.created_at.is_some());
        assert!(report.updated_at.is_none());
        assert_eq!(report.status, "REPORTED");
        assert_eq!(report.latitude, 42.5);
    }

    #[tokio::test]
    async fn get_by_id_is_idempotent() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        let first = store.get_by_id(created.id).await.unwrap().unwrap();
        let second = store.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first, created);
    }

    #[tokio::test]
    async fn get_all_orders_newest_first() {
        let store = SqliteReportStore::new(test_pool().await);

        let a = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();
        let b = store.create(sample_new_report("http://x/b.jpg")).await.unwrap();
        let c = store.create(sample_new_report("http://x/c.jpg")).await.unwrap();

        let all = store.get_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);

        // created_at is non-increasing down the list
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn get_all_on_empty_store_is_empty() {
        let store = SqliteReportStore::new(test_pool().await);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_by_user_filters_and_orders() {
        let store = SqliteReportStore::new(test_pool().await);

        let mut mine = sample_new_report("http://x/mine1.jpg");
        mine.user_id = Some(7);
        let first = store.create(mine.clone()).await.unwrap();

        store.create(sample_new_report("http://x/guest.jpg")).await.unwrap();

        mine.photo_url = "http://x/mine2.jpg".to_string();
        let second = store.create(mine).await.unwrap();

        let reports = store.get_by_user(7).await.unwrap();
        let ids: Vec<i64> = reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(store.get_by_user(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_status_reports_row_match() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        assert!(store.update_status(created.id, "CLEANED").await.unwrap());

        let updated = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(updated.status, "CLEANED");
        assert!(updated.updated_at.is_some());

        // Missing id: false, and nothing appears in the store.
        assert!(!store.update_status(9999, "CLEANED").await.unwrap());
        assert!(store.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        let changed = store
            .update_partial(created.id, &ReportPatch::default())
            .await
            .unwrap();
        assert!(!changed);

        let after = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(after, created);
    }

    #[tokio::test]
    async fn partial_update_applies_only_provided_fields() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        let patch = ReportPatch {
            severity_level: Some(Some("LOW".to_string())),
            ..Default::default()
        };

        assert!(store.update_partial(created.id, &patch).await.unwrap());

        let after = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(after.severity_level.as_deref(), Some("LOW"));
        assert_eq!(after.description, created.description);
        assert_eq!(after.status, created.status);
        assert!(after.updated_at.is_some());

        assert!(!store.update_partial(9999, &patch).await.unwrap());
    }

    #[tokio::test]
    async fn explicit_null_clears_the_column() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();
        assert!(created.description.is_some());

        let patch = ReportPatch {
            status: Some("CLEANED".to_string()),
            description: Some(None),
            ..Default::default()
        };

        assert!(store.update_partial(created.id, &patch).await.unwrap());

        let after = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(after.status, "CLEANED");
        assert!(after.description.is_none());
        // Untouched fields keep their values.
        assert_eq!(after.trash_type, created.trash_type);
        assert_eq!(after.severity_level, created.severity_level);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = SqliteReportStore::new(test_pool().await);
        let created = store.create(sample_new_report("http://x/a.jpg")).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(store.get_by_id(created.id).await.unwrap().is_none());
        assert!(!store.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let users = SqliteUserStore::new(test_pool().await);

        let new_user = NewUser {
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "hash".to_string(),
            role: "user".to_string(),
        };

        users.create(new_user.clone()).await.unwrap();

        let mut dup = new_user;
        dup.email = "other@example.com".to_string();
        let err = users.create(dup).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.to_string().contains("Username"));
    }

    #[tokio::test]
    async fn touch_last_login_sets_timestamp() {
        let users = SqliteUserStore::new(test_pool().await);

        let user = users
            .create(NewUser {
                username: "ivan".to_string(),
                email: "ivan@example.com".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();
        assert!(user.last_login.is_none());

        users.touch_last_login(user.id).await.unwrap();

        let after = users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(after.last_login.is_some());
    }
}
