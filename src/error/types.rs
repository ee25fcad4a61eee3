/**
 * API Error Taxonomy
 *
 * Every failure a controller can report maps to one of these variants.
 * Store errors are wrapped and classified: a missing row becomes 404, a
 * unique-constraint violation becomes 409, everything else 500 with the
 * underlying detail kept out of the response body.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Error type returned by all HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400)
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing, invalid or expired credential (401)
    #[error("{message}")]
    Unauthorized { message: String },

    /// Authenticated but lacking ownership or role (403)
    #[error("{message}")]
    Forbidden { message: String },

    /// Referenced entity absent (404)
    #[error("{message}")]
    NotFound { message: String },

    /// Duplicate membership, assignment or reaction (409)
    #[error("{message}")]
    Conflict { message: String },

    /// Unexpected runtime failure (500)
    #[error("{message}")]
    Internal { message: String },

    /// Store failure, classified in `status_code`
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization failure (500)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(err) => classify_db_error(err),
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to expose to the client
    ///
    /// Store and serialization failures return a generic message; the
    /// detail is logged by the response conversion instead.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Internal { message } => message.clone(),
            Self::Database(err) => match classify_db_error(err) {
                StatusCode::NOT_FOUND => "Resource not found".to_string(),
                StatusCode::CONFLICT => "Resource already exists".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Serialization(_) => "Internal server error".to_string(),
        }
    }
}

fn classify_db_error(err: &sqlx::Error) -> StatusCode {
    match err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ApiError::bad_request("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::forbidden("not yours").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::conflict("duplicate").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Resource not found");
    }

    #[test]
    fn test_public_message_passes_through() {
        let err = ApiError::forbidden("Not authorized to update this task");
        assert_eq!(err.public_message(), "Not authorized to update this task");
    }

    #[test]
    fn test_serialization_error_is_masked() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(json_err);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
