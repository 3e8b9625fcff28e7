//! HTTP side of the console.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};

use crate::auth::SESSION_COOKIE;
use crate::models::{ApplicantRecord, UpdateFoodRequest};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status; `message` is its body
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Calls the console makes against the check-in server.
#[async_trait]
pub trait CheckinBackend: Send + Sync {
    /// Resolve a scanned uid to an email address.
    async fn resolve_email(&self, uid: &str) -> Result<String, ClientError>;

    /// Fetch an applicant record; `None` when no record exists.
    async fn fetch_record(&self, email: &str) -> Result<Option<ApplicantRecord>, ClientError>;

    /// Write meal flags back.
    async fn update_food(&self, request: &UpdateFoodRequest) -> Result<(), ClientError>;
}

/// [`CheckinBackend`] talking to a running `checkin serve`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    session: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Decode(format!("bad server url {}: {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            session: session.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Decode(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.session)
    }
}

#[async_trait]
impl CheckinBackend for HttpBackend {
    async fn resolve_email(&self, uid: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.endpoint(&["api", "auth", "get-user-email"])?)
            .header(header::COOKIE, self.cookie())
            .form(&[("uid", uid)])
            .send()
            .await?;

        let status = response.status();
        let message = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(message)
    }

    async fn fetch_record(&self, email: &str) -> Result<Option<ApplicantRecord>, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["api", "forms", email])?)
            .header(header::COOKIE, self.cookie())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: response.text().await?,
            });
        }

        response
            .json::<ApplicantRecord>()
            .await
            .map(Some)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn update_food(&self, request: &UpdateFoodRequest) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint(&["api", "auth", "update-food"])?)
            .header(header::COOKIE, self.cookie())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: response.text().await?,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_escapes() {
        let backend = HttpBackend::new("http://127.0.0.1:8080/", "abc.def").unwrap();
        let url = backend.endpoint(&["api", "forms", "ada%x@uic.edu"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/forms/ada%25x@uic.edu"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = HttpBackend::new("https://checkin.example.org/admin", "s").unwrap();
        let url = backend.endpoint(&["api", "auth", "update-food"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://checkin.example.org/admin/api/auth/update-food"
        );
        assert_eq!(backend.cookie(), "__session=s");
    }

    #[test]
    fn test_bad_base_url() {
        assert!(HttpBackend::new("not a url", "s").is_err());
    }
}
