use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the review service.
///
/// Transport failures, timeouts, error statuses and undecodable bodies all
/// land here. The status is kept when the service did answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NetworkError {
    status: Option<u16>,
    message: String,
}

impl NetworkError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: StatusCode, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) => format!("service responded with {status}: {detail}"),
            None => format!("service responded with {status}"),
        };
        Self {
            status: Some(status.as_u16()),
            message,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The service reports an exhausted queue as `404` on `/place/next`.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::status(status, None);
        }
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("failed to connect: {err}")
        } else if err.is_decode() {
            format!("malformed response body: {err}")
        } else {
            format!("transport error: {err}")
        };
        Self::transport(message)
    }
}
