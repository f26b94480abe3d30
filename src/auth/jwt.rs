use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::auth::responses::Role;
use crate::auth::{AuthConfig, AuthError, AuthResult};

/// Claims embedded in every bearer token.
///
/// `sub` carries the account id and `role` the role at issue time. The gate
/// re-resolves both against the database on each request, so these claims
/// only need to survive signature and expiry checks here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub role: String,
    pub token_version: i32,
}

#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    token_ttl: Duration,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.clone()]);
        validation.leeway = 30;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            token_ttl: Duration::seconds(config.token_ttl_secs),
        })
    }

    pub fn issue_token(
        &self,
        account_id: i32,
        role: Role,
        token_version: i32,
    ) -> AuthResult<SignedToken> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = TokenClaims {
            sub: account_id.to_string(),
            iss: self.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            role: role.as_str().to_string(),
            token_version,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignedToken { token, expires_at })
    }

    /// Check signature, issuer, and expiry; nothing here touches the store.
    pub fn decode_token(&self, token: &str) -> AuthResult<TokenClaims> {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                _ => Err(AuthError::TokenInvalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;

    fn make_test_config() -> AuthConfig {
        AuthConfig {
            issuer: "accounts-test".into(),
            token_ttl_secs: 3600,
            jwt_secret: "super-secret-test-key".into(),
        }
    }

    #[test]
    fn issues_and_decodes_tokens() {
        let service = JwtService::from_config(&make_test_config()).expect("jwt service");

        let token = service.issue_token(42, Role::User, 0).expect("issue token");
        let claims = service.decode_token(&token.token).expect("decode token");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.token_version, 0);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn jti_differs_between_tokens_for_the_same_account() {
        let service = JwtService::from_config(&make_test_config()).expect("jwt service");

        let first = service.issue_token(7, Role::Admin, 0).expect("issue");
        let second = service.issue_token(7, Role::Admin, 0).expect("issue");

        let first_claims = service.decode_token(&first.token).expect("decode");
        let second_claims = service.decode_token(&second.token).expect("decode");
        assert_ne!(first_claims.jti, second_claims.jti);
    }

    #[test]
    fn rejects_garbage_and_foreign_signatures() {
        let service = JwtService::from_config(&make_test_config()).expect("jwt service");

        assert!(matches!(
            service.decode_token("not-a-token"),
            Err(AuthError::TokenInvalid)
        ));

        let other_config = AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..make_test_config()
        };
        let other = JwtService::from_config(&other_config).expect("jwt service");
        let foreign = other.issue_token(1, Role::User, 0).expect("issue");

        assert!(matches!(
            service.decode_token(&foreign.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn rejects_expired_tokens() {
        let config = AuthConfig {
            token_ttl_secs: 1,
            ..make_test_config()
        };
        let mut service = JwtService::from_config(&config).expect("jwt service");
        // Shrink the leeway so an already-expired token fails immediately.
        service.validation.leeway = 0;
        service.token_ttl = Duration::seconds(-120);

        let token = service.issue_token(9, Role::User, 0).expect("issue");
        assert!(matches!(
            service.decode_token(&token.token),
            Err(AuthError::TokenExpired)
        ));
    }
}
