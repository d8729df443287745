//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler returns `Result<_, AppError>`, and `AppError` implements
//! `actix_web::error::ResponseError`, so each failure is mapped to its status code and a
//! JSON body of the shape `{"message": ..., "errors"?: {field: [messages]}}` at the
//! request boundary.
//!
//! `From` implementations exist for `validator::ValidationErrors`, `bcrypt::BcryptError`,
//! `StoreError` and `actix_web::error::BlockingError`, allowing easy conversion with `?`.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidationErrors;

use crate::store::StoreError;

/// Field name → list of human readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message used for every login failure, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "The provided credentials do not match our records.";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or revoked bearer token (HTTP 401).
    Unauthorized(String),
    /// A request body that could not be parsed at all (HTTP 400).
    BadRequest(String),
    /// The referenced resource does not exist (HTTP 404).
    NotFound(String),
    /// Input failed shape or constraint rules (HTTP 422), with per-field messages.
    ValidationError(FieldErrors),
    /// Login failed. Deliberately carries no detail about which part was wrong (HTTP 422).
    InvalidCredentials,
    /// The store did not answer in time; the caller may retry (HTTP 503).
    ServiceUnavailable(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Builds a validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::ValidationError(errors)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(errors) => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                write!(f, "Validation Error: {}", fields.join(", "))
            }
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Internal failures are logged with their detail and answered with a generic message,
/// so database or hashing internals never reach the client.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::InvalidCredentials => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ServiceUnavailable(msg) => builder.json(ErrorBody {
                message: msg,
                errors: None,
            }),
            AppError::ValidationError(errors) => builder.json(ErrorBody {
                message: "Validation Error",
                errors: Some(errors),
            }),
            AppError::InvalidCredentials => {
                let mut errors = FieldErrors::new();
                errors.insert("email".into(), vec![INVALID_CREDENTIALS.into()]);
                builder.json(ErrorBody {
                    message: INVALID_CREDENTIALS,
                    errors: Some(&errors),
                })
            }
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                builder.json(ErrorBody {
                    message: "Server Error",
                    errors: None,
                })
            }
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// Only field-level errors are collected; every rule on the request structs carries a
/// message, and a rule without one falls back to a generic sentence naming the field.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in error.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field),
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }
        AppError::ValidationError(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Duplicate(field) => {
                AppError::field(field, format!("The {} has already been taken.", field))
            }
            StoreError::Timeout => AppError::ServiceUnavailable(
                "Service temporarily unavailable, please retry.".into(),
            ),
            StoreError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use validator::Validate;

    async fn body_json(error: AppError) -> serde_json::Value {
        let response = error.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Unauthenticated.".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Post not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::field("email", "bad");
        assert_eq!(error.error_response().status(), 422);

        assert_eq!(AppError::InvalidCredentials.error_response().status(), 422);

        let error = AppError::ServiceUnavailable("retry".into());
        assert_eq!(error.error_response().status(), 503);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_not_found_body_has_only_message() {
        let json = body_json(AppError::NotFound("Post not found".into())).await;
        assert_eq!(json, serde_json::json!({ "message": "Post not found" }));
    }

    #[actix_rt::test]
    async fn test_internal_errors_do_not_leak_detail() {
        let json = body_json(AppError::DatabaseError(
            "relation \"users\" does not exist".into(),
        ))
        .await;
        assert_eq!(json["message"], "Server Error");
        assert!(!json.to_string().contains("relation"));
    }

    #[actix_rt::test]
    async fn test_duplicate_maps_to_email_field() {
        let json = body_json(StoreError::Duplicate("email").into()).await;
        assert_eq!(json["message"], "Validation Error");
        assert_eq!(json["errors"]["email"][0], "The email has already been taken.");
    }

    #[actix_rt::test]
    async fn test_store_timeout_is_retryable() {
        let error: AppError = StoreError::Timeout.into();
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(error).await;
        assert_eq!(
            json,
            serde_json::json!({ "message": "Service temporarily unavailable, please retry." })
        );
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 8, message = "too short"))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[actix_rt::test]
    async fn test_validation_errors_are_grouped_per_field() {
        let probe = Probe {
            password: "short".into(),
            email: "nope".into(),
        };
        let error: AppError = probe.validate().unwrap_err().into();
        let json = body_json(error).await;
        assert_eq!(json["errors"]["password"][0], "too short");
        assert_eq!(json["errors"]["email"][0], "The email field is invalid.");
    }
}
