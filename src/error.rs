//! Error handling utilities for the crate
use thiserror::Error;

use crate::assets::AssetStatus;

/// All errors raised by this crate will be instances of LinkedInError
#[derive(Error, Debug)]
pub enum LinkedInError {
    #[error("No access token. Expected environment variable LINKEDIN_ACCESS_TOKEN to contain a token")]
    NotAuthenticated(),
    #[error("The access token was rejected by the API")]
    Unauthorized(),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Access denied, the token lacks the permission for this resource")]
    Forbidden(),
    #[error("The requested resource does not exist")]
    NotFound(),
    #[error("Too many requests, the API throttled this application")]
    TooManyRequests(),
    #[error("Upload registration failed: {0}")]
    RegistrationFailed(String),
    #[error("Upload of asset content failed ({}): {message}", display_http_status(.status))]
    UploadFailed {
        status: Option<u16>,
        message: String,
    },
    #[error("Timed out waiting for the asset upload to complete{}", display_last_status(.last_status))]
    UploadTimeout { last_status: Option<AssetStatus> },
    #[error("Asset processing failed: {0}")]
    UploadIncomplete(AssetStatus),
    #[error("The asset content was rejected: {0}")]
    UploadClientError(AssetStatus),
    #[error("Unable to read the content to upload: {0}")]
    SourceUnavailable(String),
    #[error("Unexpected response: {0}")]
    ResponseMalformed(String),
    #[error("Unable to fetch the asset status: {message}{}", display_last_status(.last_status))]
    StatusCheckFailed {
        message: String,
        last_status: Option<AssetStatus>,
    },
    #[error("Unknown error ({0}): {1}")]
    UnknownError(u16, String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LinkedInError {
    pub fn unknown_error(status_code: reqwest::StatusCode) -> Self {
        LinkedInError::UnknownError(
            status_code.as_u16(),
            status_code
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
        )
    }

    pub fn required(field_name: &str) -> Self {
        LinkedInError::InvalidInput(format!("{} is required", field_name))
    }

    /// The last status reported by the API, if this error carries one
    pub fn last_status(&self) -> Option<&AssetStatus> {
        match self {
            LinkedInError::UploadTimeout { last_status }
            | LinkedInError::StatusCheckFailed { last_status, .. } => last_status.as_ref(),
            LinkedInError::UploadIncomplete(status) | LinkedInError::UploadClientError(status) => {
                Some(status)
            }
            _ => None,
        }
    }

    /// Fills in the last known status of a timeout or failed status check that has none
    pub(crate) fn with_last_status(self, known: Option<&AssetStatus>) -> Self {
        match self {
            LinkedInError::UploadTimeout { last_status: None } => LinkedInError::UploadTimeout {
                last_status: known.cloned(),
            },
            LinkedInError::StatusCheckFailed {
                message,
                last_status: None,
            } => LinkedInError::StatusCheckFailed {
                message,
                last_status: known.cloned(),
            },
            other => other,
        }
    }
}

fn display_http_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("HTTP {status}"),
        None => "no response".to_string(),
    }
}

fn display_last_status(last_status: &Option<AssetStatus>) -> String {
    match last_status {
        Some(status) => format!(", last status {status}"),
        None => String::new(),
    }
}

pub(crate) type Result<T> = std::result::Result<T, LinkedInError>;
