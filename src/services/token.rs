use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::entities::users;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &users::Model, auth: &AuthConfig) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = TokenClaims {
        sub: user.id,
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(auth.jwt_expiry_hours)).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(
    token: &str,
    auth: &AuthConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn test_auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn test_user() -> users::Model {
        users::Model {
            id: 42,
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            avatar_url: None,
            provider: "dev".to_string(),
            provider_id: "dev-user-id".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_round_trip() {
        let auth = test_auth();
        let token = issue_token(&test_user(), &auth).unwrap();
        let claims = decode_token(&token, &auth).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "someone@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = test_auth();
        let token = issue_token(&test_user(), &auth).unwrap();

        let other = AuthConfig {
            jwt_secret: "different".to_string(),
            ..AuthConfig::default()
        };
        let err = decode_token(&token, &other).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthConfig {
            jwt_expiry_hours: -2,
            ..test_auth()
        };
        let token = issue_token(&test_user(), &auth).unwrap();
        let err = decode_token(&token, &auth).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }
}
