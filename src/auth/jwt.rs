//! Verification of bearer tokens minted by the hosted auth provider.
//!
//! The service never issues credentials of its own: sign-in happens against
//! the hosted backend, which hands the client an HS256 token carrying the
//! user's identity and profile claims. We share its signing secret and only
//! verify.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL from the auth provider's profile metadata.
    #[serde(default)]
    pub image: Option<String>,
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

/// Mint a token the way the hosted auth provider would. Used by tests and
/// by local tooling against a dev secret.
pub fn issue_token(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to issue token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: String::new(),
            jwt_secret: secret.into(),
            chain_rpc_url: String::new(),
            unlock_contract_address: String::new(),
        }
    }

    fn claims_for(sub: Uuid) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub,
            email: "user@example.com".into(),
            exp: now + 900,
            iat: now,
            name: Some("Test User".into()),
            image: None,
        }
    }

    #[test]
    fn test_verify_round_trip() {
        let config = test_config("dev-secret");
        let sub = Uuid::new_v4();
        let token = issue_token(&claims_for(sub), "dev-secret").unwrap();

        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, sub);
        assert_eq!(data.claims.email, "user@example.com");
        assert_eq!(data.claims.name.as_deref(), Some("Test User"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config("dev-secret");
        let token = issue_token(&claims_for(Uuid::new_v4()), "other-secret").unwrap();

        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config("dev-secret");
        let mut claims = claims_for(Uuid::new_v4());
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issue_token(&claims, "dev-secret").unwrap();

        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthorized)
        ));
    }
}
