use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("multipart error: {0}")]
    MultipartError(#[from] actix_multipart::MultipartError),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("jwt error: {0}")]
    JWTError(#[from] jsonwebtoken::errors::Error),

    #[error("smtp error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    #[error("mail error: {0}")]
    MailError(#[from] lettre::error::Error),

    #[error("invalid mail address: {0}")]
    AddressError(#[from] lettre::address::AddressError),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    UploadError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Invalid {resource} ID format")]
    MalformedId { resource: &'static str },

    #[error("{message}: {detail}")]
    ApplicationFailure { message: &'static str, detail: String },

    #[error("{0}")]
    ServerError(String),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::ValidationError(_)
            | Error::UploadError(_)
            | Error::MultipartError(_)
            | Error::MalformedId { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) | Error::JWTError(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // The application endpoints report persistence failures in the
            // same envelope shape their success responses use.
            Error::ApplicationFailure { message, detail } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "success": false,
                    "message": message,
                    "error": detail,
                }))
            }
            Error::JWTError(_) => {
                HttpResponse::build(self.status_code()).json(json!({ "message": "Invalid token" }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() })),
        }
    }
}
