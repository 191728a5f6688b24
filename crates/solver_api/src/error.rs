use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum SolverApiError {
    Request(reqwest::Error),
    Status(StatusCode, String),
    MalformedResponse(String),
    Stream(String),
    Cancelled,
}

/// Error body shape emitted by the solving service.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub detail: Option<String>,
}

impl fmt::Display for SolverApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::MalformedResponse(message) => {
                write!(f, "malformed response body: {message}")
            }
            Self::Stream(message) => write!(f, "stream failed: {message}"),
            Self::Cancelled => write!(f, "request was cancelled"),
        }
    }
}

impl std::error::Error for SolverApiError {}

impl From<reqwest::Error> for SolverApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for SolverApiError {
    fn from(error: JsonError) -> Self {
        Self::MalformedResponse(error.to_string())
    }
}

/// Extracts a human-readable message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(detail) = payload
            .detail
            .filter(|detail| !detail.trim().is_empty())
        {
            return detail;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
