//! Unified error types for the comic service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Process-level error type: configuration, startup and serving.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration deserialization error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Config file could not be read or parsed.
    #[error("config file error: {0}")]
    ConfigFile(#[from] dotenvy::Error),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),

    /// Prometheus recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// HTTP client construction error.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures talking to the external metadata source.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure.
    #[error("failed to fetch comic {num}: {source}")]
    Request {
        /// Comic number being fetched.
        num: i64,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("failed to fetch comic {num}: HTTP {status}")]
    Status {
        /// Comic number being fetched.
        num: i64,
        /// Status returned by the source.
        status: reqwest::StatusCode,
    },

    /// Response body could not be read.
    #[error("failed to read comic {num}: {source}")]
    Body {
        /// Comic number being fetched.
        num: i64,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// Response body is not a comic record.
    #[error("failed to parse comic {num}: {source}")]
    Parse {
        /// Comic number being fetched.
        num: i64,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors surfaced to HTTP clients of the `/comics` endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    /// `start` or `end` is absent from the query string.
    #[error("please include the starting and ending comic numbers")]
    MissingParameter,

    /// `start` is not a base-10 integer.
    #[error("please make sure that the starting number is an integer")]
    InvalidStart,

    /// `end` is not a base-10 integer.
    #[error("please make sure that the ending number is an integer")]
    InvalidEnd,

    /// Fetching from the metadata source failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter | ApiError::InvalidStart | ApiError::InvalidEnd => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error text attached to error responses for the access log.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = Json(ErrorResponse {
            error: message.clone(),
        });

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
