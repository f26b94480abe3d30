use crate::auth::{AuthError, AuthResult};

/// Authentication configuration loaded once at process startup.
///
/// The signing secret and token lifetime live here instead of in ambient
/// globals; the struct is managed in Rocket state and threaded through
/// explicitly.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub token_ttl_secs: i64,
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let issuer =
            std::env::var("ACCOUNTS_JWT_ISSUER").unwrap_or_else(|_| "accounts-api".into());
        let token_ttl_secs = std::env::var("ACCOUNTS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24 * 60 * 60);
        let jwt_secret = std::env::var("ACCOUNTS_JWT_SECRET")
            .map_err(|_| AuthError::Config("ACCOUNTS_JWT_SECRET is required".into()))?;

        if token_ttl_secs <= 0 {
            return Err(AuthError::Config(
                "ACCOUNTS_TOKEN_TTL_SECS must be positive".into(),
            ));
        }

        Ok(Self {
            issuer,
            token_ttl_secs,
            jwt_secret,
        })
    }
}
