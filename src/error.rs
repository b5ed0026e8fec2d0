use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use thiserror::Error;

/// The submitted configuration is not usable JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Please enter JSON configuration")]
    Empty,
    #[error("Invalid JSON: {0}")]
    Syntax(String),
}

/// The solver round trip failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },
    #[error("Could not read solver response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV export produced invalid UTF-8")]
    Encoding,
}

/// Errors surfaced by HTTP handlers that do not render a full page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No timetable has been generated yet")]
    NoResult,
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NoResult => StatusCode::NOT_FOUND,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
