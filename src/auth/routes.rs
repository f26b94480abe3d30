use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use sqlx::PgPool;

use crate::auth::AuthState;
use crate::auth::responses::{AuthTokenResponse, LoginRequest, SignupRequest};
use crate::error::ApiError;
use crate::models::UserRecord;
use crate::routes::helpers::{
    normalize_email, validate_email, validate_full_name, validate_password,
};

/// Register a new account and log it in immediately.
///
/// Every account created here gets `role = user` and `status = active`;
/// admin accounts are provisioned out of band by the `create_user` binary.
#[openapi(tag = "Auth")]
#[post("/auth/signup", data = "<payload>")]
pub async fn signup(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    payload: Json<SignupRequest>,
) -> Result<status::Custom<Json<AuthTokenResponse>>, ApiError> {
    let full_name = payload.full_name.trim().to_string();
    let email = normalize_email(&payload.email);

    validate_full_name(&full_name)?;
    validate_email(&email)?;
    validate_password(&payload.password)?;

    let taken: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = $1")
        .bind(&email)
        .fetch_optional(pool.inner())
        .await?;
    if taken.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let password_hash = state
        .password_service
        .hash_password(&payload.password)
        .map_err(ApiError::from)?;

    // The unique index on lower(email) closes the race left open by the
    // pre-check; a concurrent insert surfaces as 23505 -> EmailTaken.
    let record: UserRecord = sqlx::query_as(
        r#"INSERT INTO users (full_name, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING id, full_name, email, password_hash, role, status, token_version,
                     created_at, updated_at"#,
    )
    .bind(&full_name)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(pool.inner())
    .await?;

    let signed = state
        .jwt_service
        .issue_token(record.id, record.role(), record.token_version)
        .map_err(ApiError::from)?;

    log::info!("account {} created for {}", record.id, record.email);

    Ok(status::Custom(
        Status::Created,
        Json(AuthTokenResponse {
            token: signed.token,
            expires_at: signed.expires_at,
            user: record.summary(),
        }),
    ))
}

/// Exchange email + password for a bearer token.
///
/// Unknown email, wrong password, and an inactive account all produce the
/// same 401 body so the endpoint cannot be used to probe which addresses
/// are registered.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    payload: Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let record: Option<UserRecord> = sqlx::query_as(
        r#"SELECT id, full_name, email, password_hash, role, status, token_version,
                  created_at, updated_at
           FROM users WHERE lower(email) = $1"#,
    )
    .bind(&email)
    .fetch_optional(pool.inner())
    .await?;

    let record = match record {
        Some(record) => record,
        None => return Err(invalid_credentials()),
    };

    if !record.status().is_active() {
        return Err(invalid_credentials());
    }

    let verified = state
        .password_service
        .verify_password(&payload.password, &record.password_hash)
        .map_err(ApiError::from)?;
    if !verified {
        return Err(invalid_credentials());
    }

    let signed = state
        .jwt_service
        .issue_token(record.id, record.role(), record.token_version)
        .map_err(ApiError::from)?;

    Ok(Json(AuthTokenResponse {
        token: signed.token,
        expires_at: signed.expires_at,
        user: record.summary(),
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::InvalidCredentials("invalid credentials".to_string())
}
