use okapi::openapi3::Responses;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::ensure_status_code_exists;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::auth::AuthError;

/// Wire shape shared by every error response, including the catchers.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Route-level error mapped onto the API's error taxonomy.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    InvalidCredentials(String),
    Unauthenticated,
    Forbidden(String),
    NotFound(String),
    EmailTaken,
    Database(sqlx::Error),
    Internal(String),
}

impl ApiError {
    fn render(self) -> (Status, &'static str, String) {
        match self {
            ApiError::Validation(msg) => (Status::BadRequest, "ValidationError", msg),
            ApiError::InvalidCredentials(msg) => {
                (Status::Unauthorized, "InvalidCredentials", msg)
            }
            ApiError::Unauthenticated => (
                Status::Unauthorized,
                "Unauthenticated",
                "authentication required".to_string(),
            ),
            ApiError::Forbidden(msg) => (Status::Forbidden, "Forbidden", msg),
            ApiError::NotFound(msg) => (Status::NotFound, "NotFound", msg),
            ApiError::EmailTaken => (
                Status::Conflict,
                "EmailTaken",
                "email already registered".to_string(),
            ),
            // Infrastructure failures are logged in full but surface as an
            // opaque body; nothing about the store or the hasher leaks.
            ApiError::Database(err) => {
                log::error!("database error: {}", err);
                (
                    Status::InternalServerError,
                    "InternalError",
                    "something went wrong".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                (
                    Status::InternalServerError,
                    "InternalError",
                    "something went wrong".to_string(),
                )
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, error, message) = self.render();

        let body = ErrorBody {
            error: error.to_string(),
            message,
        };
        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"InternalError","message":"something went wrong"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        for code in [400, 401, 403, 404, 409, 500] {
            ensure_status_code_exists(&mut responses, code);
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("resource not found".to_string()),
            // The only unique constraint in the schema is the email index.
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                ApiError::EmailTaken
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => {
                ApiError::InvalidCredentials("invalid credentials".to_string())
            }
            AuthError::Unauthenticated
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::AccountInactive => ApiError::Unauthenticated,
            AuthError::Forbidden => ApiError::Forbidden("forbidden".to_string()),
            AuthError::EmailTaken => ApiError::EmailTaken,
            AuthError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            AuthError::Sqlx(err) => ApiError::from(err),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
