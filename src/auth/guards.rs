use chrono::{DateTime, Utc};
use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::request::OpenApiFromRequest;
use sqlx::{PgPool, Row};

use crate::auth::responses::{AccountStatus, Role, UserSummary};
use crate::auth::{AuthError, AuthResult, AuthState};

/// The account resolved for the current request.
///
/// Resolution happens in two steps: the bearer token authenticates itself
/// (signature + expiry), then the account row is re-fetched by id so that a
/// status flip or password change takes effect on the very next request
/// instead of waiting for the token to expire. The password hash never
/// leaves the query.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthAccount {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl AuthAccount {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthAccount {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_account(request).await {
            Ok(account) => Outcome::Success(account),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Second stage of the gate: demands the `admin` role on top of a resolved
/// account.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct RequireAdmin(pub AuthAccount);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthAccount::from_request(request).await {
            Outcome::Success(account) => {
                if account.is_admin() {
                    Outcome::Success(RequireAdmin(account))
                } else {
                    Outcome::Error((Status::Forbidden, AuthError::Forbidden))
                }
            }
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(_) => {
                Outcome::Error((Status::Unauthorized, AuthError::Unauthenticated))
            }
        }
    }
}

async fn resolve_account(request: &Request<'_>) -> AuthResult<AuthAccount> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let pool = request
        .guard::<&State<PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let claims = auth_state.jwt_service.decode_token(token)?;
    let account_id: i32 = claims.sub.parse().map_err(|_| AuthError::TokenInvalid)?;

    let row = sqlx::query(
        "SELECT full_name, email, role, status, token_version, created_at FROM users WHERE id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool.inner())
    .await?;

    // A vanished account is indistinguishable from a bad token on the wire.
    let row = row.ok_or(AuthError::Unauthenticated)?;
    let full_name: String = row.try_get("full_name")?;
    let email: String = row.try_get("email")?;
    let role_str: String = row.try_get("role")?;
    let status_str: String = row.try_get("status")?;
    let token_version: i32 = row.try_get("token_version")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    let status = AccountStatus::from_str(&status_str);
    if !status.is_active() {
        return Err(AuthError::AccountInactive);
    }

    // Tokens minted before the latest password change carry a stale version.
    if token_version != claims.token_version {
        return Err(AuthError::TokenInvalid);
    }

    // Roles are immutable, so a mismatch means the token was not minted for
    // this account as it exists now.
    let role = Role::from_str(&role_str);
    if role.as_str() != claims.role {
        return Err(AuthError::TokenInvalid);
    }

    Ok(AuthAccount {
        id: account_id,
        full_name,
        email,
        role,
        status,
        created_at,
    })
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::Unauthenticated)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Unauthenticated)
    }
}
