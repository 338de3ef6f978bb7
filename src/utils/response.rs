use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use tracing::error;

use crate::models::error::ComicError;

/// Standard `{message}` body, used for confirmations and failures alike.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}

/// Request-boundary rendering of a `ComicError`.
///
/// Validation and not-found errors carry their own caller-facing message;
/// everything else becomes a 500 with the endpoint's generic message, and
/// the root cause goes to the log only.
pub struct ApiError {
    status: Status,
    message: String,
}

impl ApiError {
    pub fn from(err: ComicError, fallback: &str) -> Self {
        match err {
            ComicError::Validation(message) => ApiError {
                status: Status::BadRequest,
                message,
            },
            ComicError::NotFound => ApiError {
                status: Status::NotFound,
                message: "Comic not found".to_string(),
            },
            other => {
                error!(error = %other, "{fallback}");
                ApiError {
                    status: Status::InternalServerError,
                    message: fallback.to_string(),
                }
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Json(Message::new(self.message)).respond_to(request)?;
        response.set_status(self.status);
        Ok(response)
    }
}
