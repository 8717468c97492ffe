//! Error types for the catalog client

use reqwest::StatusCode;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const FALLBACK_MESSAGE: &str = "An unknown error occurred";

/// `{error, message}` part of a failed server envelope
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with {status}")]
    Server {
        status: StatusCode,
        body: Option<ErrorBody>,
    },

    #[error("response carried no data")]
    MissingData,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidFile(String),

    #[error("Token with symbol {0} already exists")]
    SymbolTaken(String),

    #[error("upload cancelled")]
    Cancelled,
}

impl ApiError {
    /// Text shown to the user: the server's `error` field, then its
    /// `message` field, then this error's own description.
    pub fn display_message(&self) -> String {
        if let ApiError::Server { body: Some(body), .. } = self {
            let from_body = [body.error.as_deref(), body.message.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|s| !s.is_empty());
            if let Some(text) = from_body {
                return text.to_string();
            }
        }
        let own = self.to_string();
        if own.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            own
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(error: url::ParseError) -> Self {
        ApiError::InvalidUrl(error.to_string())
    }
}
