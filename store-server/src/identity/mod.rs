//! Shopper Identity
//!
//! Anonymous carts and wallets are tracked through an explicit,
//! server-issued token validated on every request, never through an
//! ambient client-stored identifier. The token is a signed JWT whose `sub`
//! is the shopper id; the row in `shopper` remains the single authority
//! for balances and entitlements.

pub mod extractor;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extractor::CurrentShopper;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Signing secret (at least 32 bytes)
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    /// Token issuer
    pub issuer: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        let secret = std::env::var("SHOPPER_TOKEN_SECRET").unwrap_or_else(|_| {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "⚠️  SHOPPER_TOKEN_SECRET not set! Using insecure default key. DO NOT USE IN PRODUCTION!"
                );
                "dev-secret-key-change-in-production-min-32-chars-long".to_string()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("🚨 FATAL: SHOPPER_TOKEN_SECRET environment variable is not set!");
            }
        });

        Self {
            secret,
            expiration_minutes: std::env::var("SHOPPER_TOKEN_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(43_200), // 30 days: anonymous carts are long-lived
            issuer: std::env::var("SHOPPER_TOKEN_ISSUER")
                .unwrap_or_else(|_| "store-server".to_string()),
        }
    }
}

/// Claims stored in a shopper token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopperClaims {
    /// Shopper ID
    pub sub: String,
    /// Anonymous identity (not yet claimed at login)
    pub anon: bool,
    /// Expiration timestamp (seconds)
    pub exp: i64,
    /// Issued at (seconds)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// Shopper token service
#[derive(Clone)]
pub struct TokenService {
    pub config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new() -> Self {
        Self::with_config(TokenConfig::default())
    }

    pub fn with_config(config: TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    /// Issue a token for a shopper id
    pub fn issue(&self, shopper_id: i64, anon: bool) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = ShopperClaims {
            sub: shopper_id.to_string(),
            anon,
            exp: (now + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::GenerationFailed(e.to_string()))
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<ShopperClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<ShopperClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                _ => TokenError::InvalidToken(e.to_string()),
            })
    }
}

impl Default for TokenService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::with_config(TokenConfig {
            secret: "test-secret-key-that-is-long-enough-123".to_string(),
            expiration_minutes: 60,
            issuer: "store-server".to_string(),
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = test_service();
        let token = service.issue(42, true).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.anon);
        assert_eq!(claims.iss, "store-server");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = test_service();
        let token = service.issue(42, true).unwrap();
        let tampered = format!("{}x", token);
        assert!(matches!(
            service.verify(&tampered),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::with_config(TokenConfig {
            secret: "test-secret-key-that-is-long-enough-123".to_string(),
            expiration_minutes: -10, // already expired at issue time
            issuer: "store-server".to_string(),
        });
        let token = service.issue(42, true).unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let service = test_service();
        let other = TokenService::with_config(TokenConfig {
            secret: "test-secret-key-that-is-long-enough-123".to_string(),
            expiration_minutes: 60,
            issuer: "someone-else".to_string(),
        });
        let token = other.issue(42, true).unwrap();
        assert!(matches!(
            service.verify(&token),
            Err(TokenError::InvalidToken(_))
        ));
    }
}
