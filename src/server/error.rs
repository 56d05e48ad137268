//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; the status code comes from
//! [`Error::http_status`] and the body is `{error, code}`, plus the commit
//! log when an ingest failed part way through its writes.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photostore_common::Error;
use serde_json::json;

use crate::ingest::{CommitLog, IngestError, IngestState};

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: Error,
    failed_at: Option<IngestState>,
    commit_log: Option<CommitLog>,
    status_override: Option<StatusCode>,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self {
            inner,
            failed_at: None,
            commit_log: None,
            status_override: None,
        }
    }

    /// A malformed or oversized multipart body.
    pub fn multipart(err: MultipartError) -> Self {
        let status = err.status();
        let mut app = Self::new(Error::validation(format!(
            "Invalid multipart body: {}",
            err.body_text()
        )));
        app.status_override = Some(status);
        app
    }

    pub fn status(&self) -> StatusCode {
        self.status_override.unwrap_or_else(|| {
            StatusCode::from_u16(self.inner.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        Self {
            inner: e.source,
            failed_at: Some(e.failed_at),
            commit_log: e.commit_log,
            status_override: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let mut body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
        });
        if let Some(state) = self.failed_at {
            body["failed_at"] = json!(state);
        }
        if let Some(log) = self.commit_log {
            body["commit_log"] = json!(log);
        }

        (status, axum::Json(body)).into_response()
    }
}
