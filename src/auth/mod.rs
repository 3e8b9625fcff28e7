//! Session-cookie authentication and the admin gate.
//!
//! A request passes when it carries a `__session` cookie the identity provider
//! accepts and the session's user holds the `admin` claim.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::errors::AppError;
use crate::identity::{IdentityError, IdentityProvider};
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "__session";

const SESSION_EXPIRED: &str = "Session expired. Please sign out and sign in again";

/// An authenticated caller holding the admin claim.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub uid: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize_admin(&parts.headers, state.identity.as_ref()).await
    }
}

/// Run both gates: session validity, then the admin claim.
pub async fn authorize_admin(
    headers: &HeaderMap,
    provider: &dyn IdentityProvider,
) -> Result<AdminSession, AppError> {
    let Some(cookie) = session_cookie(headers) else {
        return Err(AppError::Unauthorized("No token found".to_string()));
    };

    let decoded = match provider.verify_session_cookie(&cookie).await {
        Ok(decoded) => decoded,
        Err(IdentityError::InvalidSession) | Err(IdentityError::UserNotFound(_)) => {
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }
        Err(IdentityError::Backend(e)) => {
            tracing::error!("Something is wrong with verifying cookie: {}", e);
            return Err(AppError::Internal(SESSION_EXPIRED.to_string()));
        }
    };

    let user = match provider.get_user(&decoded.uid).await {
        Ok(user) => user,
        Err(IdentityError::Backend(e)) => {
            tracing::error!("Something is wrong with loading session user: {}", e);
            return Err(AppError::Internal(SESSION_EXPIRED.to_string()));
        }
        Err(e) => {
            tracing::warn!(uid = %decoded.uid, "Session user lookup failed: {}", e);
            return Err(AppError::Unauthorized("Not accessible".to_string()));
        }
    };

    tracing::debug!(
        uid = %decoded.uid,
        session = %decoded.session_id,
        expires_at = %decoded.expires_at,
        "Session verified"
    );

    if !user.admin {
        tracing::warn!(uid = %user.uid, "Not admin");
        return Err(AppError::Unauthorized("Not accessible".to_string()));
    }

    Ok(AdminSession { uid: user.uid })
}

/// Extract the `__session` cookie value from all `Cookie` headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_session_cookie_among_others() {
        let headers = headers_with(&["theme=dark; __session=abc.def; lang=en"]);
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_cookie_in_second_header() {
        let headers = headers_with(&["theme=dark", "__session=\"abc.def\""]);
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_cookie_missing_or_empty() {
        assert!(session_cookie(&HeaderMap::new()).is_none());
        assert!(session_cookie(&headers_with(&["session=abc.def"])).is_none());
        assert!(session_cookie(&headers_with(&["__session="])).is_none());
    }
}
