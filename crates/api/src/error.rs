use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use thiserror::Error;

/// Error returned by every controller. Each use case converts its own error
/// into one of these in its `handle_error`.
#[derive(Error, Debug)]
pub enum TodoReminderError {
    #[error("Internal server error")]
    InternalError,
    /// Invalid reminder content, recurrence rule, pagination or delay
    #[error("Invalid data provided: `{0}`")]
    BadClientData(String),
    /// The occurrence is not in a state that allows the transition,
    /// e.g. it is already delivered or completed
    #[error("The occurrence or reminder is in a conflicting state: `{0}`")]
    Conflict(String),
    /// Missing or empty caller identity
    #[error("Unauthorized request: `{0}`")]
    Unauthorized(String),
    /// Unknown, deleted or owned by another user
    #[error("404 Not found: `{0}`")]
    NotFound(String),
}

impl actix_web::error::ResponseError for TodoReminderError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadClientData(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(self.to_string())
    }
}
