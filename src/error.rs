use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

/// Failures while loading the dictionary at startup. All of these are fatal.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary")]
    Parse(#[from] serde_yaml::Error),

    #[error("map key must be a string or number, got {found}")]
    InvalidMapKey { found: String },
}

/// Failures reading or decoding a round file.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("invalid round id {0:?}")]
    InvalidRoundId(String),

    #[error("failed to read round file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list round directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode round file {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },

    #[error("malformed round record: {0}")]
    Malformed(&'static str),

    #[error("round read task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// A single event entry that cannot be rendered. Its siblings are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event entry has no string `e_type`")]
    MissingType,

    #[error("event entry has no `data` mapping")]
    MissingData,

    #[error("event data has no numeric `ts`")]
    MissingTimestamp,

    #[error("event timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Boundary error. The caller only ever sees the fixed message; details go to the log.
#[derive(Debug)]
pub enum ApiError {
    Logs,
    RoundsData,
}

impl ApiError {
    fn message(&self) -> &'static str {
        match self {
            ApiError::Logs => "Error reading logs",
            ApiError::RoundsData => "Error reading rounds data",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message().to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
