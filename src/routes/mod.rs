//! HTTP route handlers.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive an OpenAPI document automatically. The
//! signup/login handlers live with the rest of the authentication core in
//! [`crate::auth::routes`].

pub mod health;
pub(crate) mod helpers;
pub mod params;
pub mod users;
