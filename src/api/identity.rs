//! Identity resolution endpoint.

use std::convert::Infallible;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Form,
};
use serde::Deserialize;

use super::ApiResult;
use crate::auth::AdminSession;
use crate::errors::{AppError, GENERIC_SERVER_ERROR};
use crate::identity::IdentityError;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct UidFields {
    #[serde(default)]
    uid: String,
}

/// Form body of `POST /api/auth/get-user-email`.
///
/// Read from either a urlencoded or a `multipart/form-data` body. A body that
/// cannot be read yields an empty uid.
#[derive(Debug)]
pub struct UidForm {
    pub uid: String,
}

impl<S> FromRequest<S> for UidForm
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        let uid = if multipart {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => multipart_uid(multipart).await,
                Err(e) => {
                    tracing::debug!("Unreadable multipart body: {}", e);
                    None
                }
            }
        } else {
            match Form::<UidFields>::from_request(req, state).await {
                Ok(Form(fields)) => Some(fields.uid),
                Err(e) => {
                    tracing::debug!("Unreadable form body: {}", e);
                    None
                }
            }
        };

        Ok(UidForm {
            uid: uid.unwrap_or_default(),
        })
    }
}

async fn multipart_uid(mut multipart: Multipart) -> Option<String> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("uid") {
            return field.text().await.ok();
        }
    }
    None
}

/// POST /api/auth/get-user-email - Resolve a uid to its email address.
///
/// Runs only after [`AdminSession`] has passed both gates.
pub async fn get_user_email(
    State(state): State<AppState>,
    admin: AdminSession,
    form: UidForm,
) -> ApiResult<String> {
    let uid = form.uid.trim();
    if uid.is_empty() {
        return Err(AppError::BadRequest("Empty uid".to_string()));
    }

    match state.identity.get_user(uid).await {
        Ok(user) => match user.email {
            Some(email) if !email.is_empty() => {
                tracing::info!(admin = %admin.uid, uid = %uid, "Resolved user email");
                Ok(email)
            }
            _ => Err(AppError::BadRequest("User has no email address".to_string())),
        },
        Err(IdentityError::UserNotFound(_)) => {
            tracing::info!(admin = %admin.uid, uid = %uid, "Lookup of unknown uid");
            Err(AppError::BadRequest("User does not exist".to_string()))
        }
        Err(e) => {
            tracing::error!(uid = %uid, "Resolving user email failed: {}", e);
            Err(AppError::Internal(GENERIC_SERVER_ERROR.to_string()))
        }
    }
}
