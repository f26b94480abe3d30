use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::AuthState;
use crate::auth::guards::{AuthAccount, RequireAdmin};
use crate::auth::responses::{AccountStatus, Role, UserSummary};
use crate::error::ApiError;
use crate::models::UserRow;
use crate::routes::helpers::{
    normalize_email, validate_email, validate_full_name, validate_password,
};
use crate::routes::params::PaginationParams;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub page: i64,
    pub limit: i64,
    pub total_users: i64,
    pub total_pages: i64,
    pub users: Vec<UserSummary>,
}

/// The account behind the presented token, as resolved by the auth gate.
#[openapi(tag = "Users")]
#[get("/users/me")]
pub async fn current_user(account: AuthAccount) -> Json<UserSummary> {
    Json(account.summary())
}

/// Update the caller's display name and email.
#[openapi(tag = "Users")]
#[put("/users/me", data = "<payload>")]
pub async fn update_profile(
    account: AuthAccount,
    pool: &State<PgPool>,
    payload: Json<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let full_name = payload.full_name.trim().to_string();
    let email = normalize_email(&payload.email);

    validate_full_name(&full_name)?;
    validate_email(&email)?;

    let owner: Option<i32> =
        sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = $1 AND id <> $2")
            .bind(&email)
            .bind(account.id)
            .fetch_optional(pool.inner())
            .await?;
    if owner.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let row: UserRow = sqlx::query_as(
        r#"UPDATE users SET full_name = $1, email = $2, updated_at = now()
           WHERE id = $3
           RETURNING id, full_name, email, role, status, created_at"#,
    )
    .bind(&full_name)
    .bind(&email)
    .bind(account.id)
    .fetch_one(pool.inner())
    .await?;

    Ok(Json(ProfileUpdateResponse {
        message: "profile updated".to_string(),
        user: row.into_summary(),
    }))
}

/// Replace the caller's password after verifying the current one.
///
/// Bumping `token_version` in the same statement invalidates every token
/// issued before the change, including the one authenticating this request.
#[openapi(tag = "Users")]
#[put("/users/me/password", data = "<payload>")]
pub async fn change_password(
    account: AuthAccount,
    state: &State<AuthState>,
    pool: &State<PgPool>,
    payload: Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_password(&payload.new_password)?;

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    // Lock the row so a concurrent change cannot interleave between the
    // verification below and the replacement write.
    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1 FOR UPDATE")
            .bind(account.id)
            .fetch_optional(&mut *tx)
            .await?;
    let stored = stored.ok_or(ApiError::Unauthenticated)?;

    let verified = state
        .password_service
        .verify_password(&payload.old_password, &stored)
        .map_err(ApiError::from)?;
    if !verified {
        return Err(ApiError::InvalidCredentials(
            "old password incorrect".to_string(),
        ));
    }

    let new_hash = state
        .password_service
        .hash_password(&payload.new_password)
        .map_err(ApiError::from)?;

    sqlx::query(
        r#"UPDATE users
           SET password_hash = $1, token_version = token_version + 1, updated_at = now()
           WHERE id = $2"#,
    )
    .bind(&new_hash)
    .bind(account.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await.map_err(ApiError::from)?;

    log::info!("password changed for account {}", account.id);

    Ok(Json(MessageResponse {
        message: "password changed".to_string(),
    }))
}

/// Admin-only paginated listing of all accounts.
#[openapi(tag = "Admin")]
#[get("/users?<params..>")]
pub async fn list_users(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
    params: PaginationParams,
) -> Result<Json<UserListResponse>, ApiError> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool.inner())
        .await?;

    let rows: Vec<UserRow> = sqlx::query_as(
        r#"SELECT id, full_name, email, role, status, created_at
           FROM users ORDER BY id ASC
           LIMIT $1 OFFSET $2"#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool.inner())
    .await?;

    Ok(Json(UserListResponse {
        page: params.page(),
        limit: params.limit(),
        total_users,
        total_pages: params.total_pages(total_users),
        users: rows.into_iter().map(UserRow::into_summary).collect(),
    }))
}

/// Re-admit an account. Applies to any role, admins included.
#[openapi(tag = "Admin")]
#[patch("/users/<id>/activate")]
pub async fn activate_user(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
    id: i32,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("UPDATE users SET status = $1, updated_at = now() WHERE id = $2")
        .bind(AccountStatus::Active.as_str())
        .bind(id)
        .execute(pool.inner())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("user {id} not found")));
    }

    Ok(Json(MessageResponse {
        message: format!("user {id} activated"),
    }))
}

/// Bar an account from further requests, effective on its next request.
///
/// Admin targets are refused: the toggle surface never transitions an admin
/// to inactive.
#[openapi(tag = "Admin")]
#[patch("/users/<id>/deactivate")]
pub async fn deactivate_user(
    _admin: RequireAdmin,
    pool: &State<PgPool>,
    id: i32,
) -> Result<Json<MessageResponse>, ApiError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool.inner())
        .await?;
    let role = role.ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

    if Role::from_str(&role) == Role::Admin {
        return Err(ApiError::Forbidden(
            "admin accounts cannot be deactivated".to_string(),
        ));
    }

    sqlx::query("UPDATE users SET status = $1, updated_at = now() WHERE id = $2")
        .bind(AccountStatus::Inactive.as_str())
        .bind(id)
        .execute(pool.inner())
        .await?;

    log::info!("user {id} deactivated");

    Ok(Json(MessageResponse {
        message: format!("user {id} deactivated"),
    }))
}
