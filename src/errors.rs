use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// A single failed check on an input model field.
#[derive(Clone, Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Unified error response body.
#[derive(Serialize)]
pub struct ErrorResponse<'a> {
    pub code: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<&'a [FieldError]>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbError(#[from] DbErr),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // A full-entity update against a missing row surfaces from SeaORM
            // as RecordNotUpdated; the benchmark treats that as a plain 404.
            AppError::DbError(DbErr::RecordNotUpdated) => StatusCode::NOT_FOUND,
            AppError::DbError(_) | AppError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            AppError::Validation(list) => Some(list.as_slice()),
            _ => None,
        };
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
            errors,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DbError(DbErr::RecordNotUpdated) => "NOT_FOUND",
            AppError::DbError(_) => "DB_ERROR",
            AppError::JsonError(_) => "JSON_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) | AppError::Validation(_) => "INVALID_INPUT",
        }
    }
}
