//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid storage backend: {0} (expected postgres or memory)")]
    Storage(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Username Taken")]
    UsernameTaken,
    #[error("Name Taken")]
    NameTaken,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UsernameTaken | AppError::NameTaken | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Not-found responses carry no body; the two "taken" conditions answer with their fixed text.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            taken @ (AppError::UsernameTaken | AppError::NameTaken) => {
                (status, taken.to_string()).into_response()
            }
            AppError::NotFound(what) => {
                tracing::debug!(%what, "not found");
                status.into_response()
            }
            AppError::Db(sqlx::Error::RowNotFound) => status.into_response(),
            AppError::BadRequest(msg) => {
                tracing::warn!(%msg, "rejected request");
                (status, msg).into_response()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (status, "Internal Server Error").into_response()
            }
        }
    }
}

/// Maps a unique-constraint violation to `taken`, passing every other error through.
pub(crate) fn unique_violation_as(err: sqlx::Error, taken: AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => taken,
        _ => AppError::Db(err),
    }
}

/// Maps a foreign-key violation to `missing`, passing every other error through.
pub(crate) fn foreign_key_violation_as(err: sqlx::Error, missing: AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => missing,
        _ => AppError::Db(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn taken_errors_are_plain_text_400() {
        let resp = AppError::UsernameTaken.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Username Taken");

        let resp = AppError::NameTaken.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Name Taken");
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let resp = AppError::NotFound("campaign 7".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let resp = AppError::Internal("lock poisoned".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(resp).await, "Internal Server Error");
    }

    #[test]
    fn non_database_errors_pass_through_violation_mapping() {
        let err = unique_violation_as(sqlx::Error::RowNotFound, AppError::NameTaken);
        assert!(matches!(err, AppError::Db(sqlx::Error::RowNotFound)));
        let err = foreign_key_violation_as(sqlx::Error::PoolTimedOut, AppError::NotFound("x".into()));
        assert!(matches!(err, AppError::Db(sqlx::Error::PoolTimedOut)));
    }
}
