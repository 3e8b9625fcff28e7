//! Provisioning of users, sessions and applicant forms.
//!
//! These stand in for the sign-in and application-intake flows, which live
//! outside this service.

use std::path::Path;

use chrono::Duration;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{ApplicantRecord, SessionRecord, UserRecord};

/// Create or update a user and its admin claim.
pub async fn add_user(
    repo: &Repository,
    uid: &str,
    email: Option<&str>,
    admin: bool,
) -> Result<UserRecord, AppError> {
    let user = repo.upsert_user(uid.trim(), email, admin).await?;
    tracing::info!(uid = %user.uid, admin = user.admin, "Saved user");
    Ok(user)
}

/// Issue a session for `uid`, valid for `ttl_hours`.
pub async fn issue_session(
    repo: &Repository,
    uid: &str,
    ttl_hours: i64,
) -> Result<SessionRecord, AppError> {
    if ttl_hours <= 0 {
        return Err(AppError::Validation(
            "Session lifetime must be positive".to_string(),
        ));
    }
    let ttl = Duration::try_hours(ttl_hours)
        .ok_or_else(|| AppError::Validation("Session lifetime is too long".to_string()))?;

    let purged = repo.delete_expired_sessions().await?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let session = repo.create_session(uid, ttl).await?;
    tracing::info!(uid = %session.uid, expires_at = %session.expires_at, "Issued session");
    Ok(session)
}

/// Load a JSON array of applicant forms and upsert them by email.
pub async fn import_forms(repo: &Repository, path: &Path) -> Result<usize, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::BadRequest(format!("Cannot read {}: {}", path.display(), e)))?;

    let records: Vec<ApplicantRecord> = serde_json::from_str(&raw)?;
    let count = repo.import_forms(&records).await?;
    tracing::info!("Imported {} forms from {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::AppStatus;
    use tempfile::TempDir;

    async fn repo(temp_dir: &TempDir) -> Repository {
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_import_forms_upserts_by_email() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir).await;
        let path = temp_dir.path().join("forms.json");

        std::fs::write(
            &path,
            r#"[
                {"email": "ada@uic.edu", "firstName": "Ada", "appStatus": "waitlist"},
                {"email": "grace@gmail.com", "firstName": "Grace", "appStatus": "fullyAccepted", "d1Snack": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(import_forms(&repo, &path).await.unwrap(), 2);

        std::fs::write(
            &path,
            r#"[{"email": "ada@uic.edu", "firstName": "Ada", "appStatus": "fullyAccepted"}]"#,
        )
        .unwrap();
        assert_eq!(import_forms(&repo, &path).await.unwrap(), 1);

        let ada = repo.get_form("ada@uic.edu").await.unwrap().unwrap();
        assert_eq!(ada.app_status, AppStatus::FullyAccepted);
        let grace = repo.get_form("grace@gmail.com").await.unwrap().unwrap();
        assert!(grace.d1_snack);
    }

    #[tokio::test]
    async fn test_import_rejects_blank_email_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir).await;
        let path = temp_dir.path().join("forms.json");

        std::fs::write(
            &path,
            r#"[{"email": "ada@uic.edu"}, {"email": "  "}]"#,
        )
        .unwrap();

        let err = import_forms(&repo, &path).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.get_form("ada@uic.edu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_session_requires_user() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir).await;

        let err = issue_session(&repo, "ghost", 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        add_user(&repo, "admin-1", Some("admin@uic.edu"), true)
            .await
            .unwrap();
        let session = issue_session(&repo, "admin-1", 1).await.unwrap();
        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.uid, "admin-1");
        assert_eq!(stored.secret, session.secret);

        assert!(issue_session(&repo, "admin-1", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_issue_session_rejects_unrepresentable_lifetimes() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir).await;
        add_user(&repo, "admin-1", Some("admin@uic.edu"), true)
            .await
            .unwrap();

        // Fits in a duration but not past now
        let err = issue_session(&repo, "admin-1", 10_000_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Does not fit in a duration at all
        let err = issue_session(&repo, "admin-1", i64::MAX).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = repo
            .create_session("admin-1", Duration::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
