//! JSON catchers so guard rejections and router misses share the same error
//! body shape as handler-produced failures.

use rocket::Request;
use rocket::serde::json::Json;

use crate::error::ErrorBody;

fn body(error: &str, message: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: error.to_string(),
        message: message.into(),
    })
}

#[catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    body("ValidationError", "malformed request")
}

#[catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    body("Unauthenticated", "authentication required")
}

#[catch(403)]
pub fn forbidden() -> Json<ErrorBody> {
    body("Forbidden", "insufficient privileges")
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<ErrorBody> {
    body("NotFound", format!("no route for {}", req.uri()))
}

#[catch(422)]
pub fn unprocessable_entity() -> Json<ErrorBody> {
    body("ValidationError", "request body could not be parsed")
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    body("InternalError", "something went wrong")
}
