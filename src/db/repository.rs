//! Database repository for applicant documents, users and sessions.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    AppStatus, ApplicantRecord, MealField, SessionRecord, UpdateFoodRequest, UserRecord,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== FORM OPERATIONS ====================

    /// Get the applicant document stored under `email`.
    pub async fn get_form(&self, email: &str) -> Result<Option<ApplicantRecord>, AppError> {
        let row = sqlx::query("SELECT data FROM forms WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(form_from_row).transpose()
    }

    /// Insert or replace many documents in one transaction.
    pub async fn import_forms(&self, records: &[ApplicantRecord]) -> Result<usize, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for record in records {
            if record.email.trim().is_empty() {
                return Err(AppError::Validation(
                    "Every form needs an email".to_string(),
                ));
            }
            let data = serde_json::to_string(record)?;
            sqlx::query(
                "INSERT INTO forms (email, app_status, data, updated_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(email) DO UPDATE SET app_status = excluded.app_status, data = excluded.data, updated_at = excluded.updated_at",
            )
            .bind(&record.email)
            .bind(record.app_status.as_str())
            .bind(&data)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records.len())
    }

    /// Write meal and check-in flags onto a fully accepted applicant's document.
    ///
    /// The flags are merged into the stored JSON, so every other field is left
    /// as it was. No version check: the last write wins.
    pub async fn update_food(
        &self,
        request: &UpdateFoodRequest,
    ) -> Result<ApplicantRecord, AppError> {
        let patch = food_patch(request);
        let now = Utc::now().to_rfc3339();

        // A single statement takes the write lock up front
        let row = sqlx::query(
            "UPDATE forms SET data = json_patch(data, ?), updated_at = ?
             WHERE email = ? AND app_status = ?
             RETURNING data",
        )
        .bind(&patch)
        .bind(&now)
        .bind(&request.email)
        .bind(AppStatus::FullyAccepted.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return form_from_row(&row);
        }

        let row = sqlx::query("SELECT app_status FROM forms WHERE email = ?")
            .bind(&request.email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let status: String = row.get("app_status");
                let status: AppStatus = status.parse().map_err(AppError::Database)?;
                Err(AppError::Validation(format!("{}: {}", request.email, status)))
            }
            None => Err(AppError::NotFound("No data found".to_string())),
        }
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query("SELECT uid, email, admin, created_at FROM users WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Create a user or update its email and admin claim.
    pub async fn upsert_user(
        &self,
        uid: &str,
        email: Option<&str>,
        admin: bool,
    ) -> Result<UserRecord, AppError> {
        if uid.trim().is_empty() {
            return Err(AppError::Validation("uid is required".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (uid, email, admin, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(uid) DO UPDATE SET email = excluded.email, admin = excluded.admin",
        )
        .bind(uid)
        .bind(email)
        .bind(admin as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_user(uid)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after upsert", uid)))
    }

    // ==================== SESSION OPERATIONS ====================

    /// Issue a new session for an existing user.
    pub async fn create_session(
        &self,
        uid: &str,
        ttl: Duration,
    ) -> Result<SessionRecord, AppError> {
        if self.get_user(uid).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", uid)));
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Validation("Session lifetime is too long".to_string()))?;
        let session = SessionRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            secret: format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            ),
            uid: uid.to_string(),
            expires_at,
        };

        sqlx::query(
            "INSERT INTO sessions (id, secret, uid, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.secret)
        .bind(&session.uid)
        .bind(timestamp(session.expires_at))
        .bind(timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Get a session by id, expired or not.
    pub async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, AppError> {
        let row = sqlx::query("SELECT id, secret, uid, expires_at FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// Delete every session whose expiry has passed.
    pub async fn delete_expired_sessions(&self) -> Result<u64, AppError> {
        let now = timestamp(Utc::now());
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ==================== ROW MAPPERS ====================

/// Fixed-width UTC timestamps so text comparison in SQL orders correctly.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// JSON merge patch carrying all six meal flags and any check-in flags sent.
fn food_patch(request: &UpdateFoodRequest) -> String {
    let mut patch = serde_json::Map::new();
    for field in MealField::ALL {
        patch.insert(field.name().to_string(), request.meals.get(field).into());
    }
    if let Some(checkin1) = request.checkin1 {
        patch.insert("checkin1".to_string(), checkin1.into());
    }
    if let Some(checkin2) = request.checkin2 {
        patch.insert("checkin2".to_string(), checkin2.into());
    }
    serde_json::Value::Object(patch).to_string()
}

fn form_from_row(row: &SqliteRow) -> Result<ApplicantRecord, AppError> {
    let data: String = row.get("data");
    serde_json::from_str(&data).map_err(|e| {
        tracing::error!("Corrupt form document: {:?}", e);
        AppError::Database(format!("Corrupt form document: {}", e))
    })
}

fn user_from_row(row: &SqliteRow) -> UserRecord {
    let admin: i32 = row.get("admin");
    UserRecord {
        uid: row.get("uid"),
        email: row.get("email"),
        admin: admin != 0,
        created_at: row.get("created_at"),
    }
}

fn session_from_row(row: &SqliteRow) -> Result<SessionRecord, AppError> {
    let expires_at: String = row.get("expires_at");
    let expires_at = DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|e| AppError::Database(format!("Corrupt session expiry: {}", e)))?
        .with_timezone(&Utc);

    Ok(SessionRecord {
        id: row.get("id"),
        secret: row.get("secret"),
        uid: row.get("uid"),
        expires_at,
    })
}
