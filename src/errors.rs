use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SleepError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("import format error: {0}")]
    ImportFormat(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl SleepError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<SleepError> for AppError {
    fn from(err: SleepError) -> Self {
        match err {
            SleepError::Export(_) => Self::internal(err),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_errors_map_to_status_codes() {
        let err = AppError::from(SleepError::validation("bedtime", "not a time"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "invalid bedtime: not a time");

        let err = AppError::from(SleepError::ImportFormat("no header".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = AppError::from(SleepError::Export("flush failed".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "export failed: flush failed");
    }
}
