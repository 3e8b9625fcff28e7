//! Applicant form endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use super::ApiResult;
use crate::auth::AdminSession;
use crate::errors::AppError;
use crate::models::{ApplicantRecord, UpdateFoodRequest};
use crate::AppState;

/// GET /api/forms/{email} - Get one applicant record.
pub async fn get_form(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(email): Path<String>,
) -> ApiResult<Json<ApplicantRecord>> {
    match state.repo.get_form(email.trim()).await? {
        Some(record) => Ok(Json(record)),
        None => Err(AppError::NotFound("No data found".to_string())),
    }
}

/// POST /api/auth/update-food - Record meals for a fully accepted applicant.
///
/// The body is JSON but is accepted without a JSON content type.
pub async fn update_food(
    State(state): State<AppState>,
    admin: AdminSession,
    body: Bytes,
) -> ApiResult<&'static str> {
    let mut request: UpdateFoodRequest = serde_json::from_slice(&body)?;
    request.email = request.email.trim().to_string();

    if request.email.is_empty() {
        return Err(AppError::Validation("Empty email".to_string()));
    }

    let record = state.repo.update_food(&request).await?;
    tracing::info!(
        admin = %admin.uid,
        email = %record.email,
        meals = ?record.meals(),
        "Updated food data"
    );

    Ok("Updated Food data!")
}
