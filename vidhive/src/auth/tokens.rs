//! Token issuing and verification.
//!
//! Access and refresh tokens are compact JWTs signed with two distinct
//! secrets, so possession of one class of token can never be used to
//! forge the other. Each token carries a `token_type` claim that is
//! checked on verification in addition to signature and expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};
use super::models::UserId;

/// Token type claim value for access tokens
const TOKEN_TYPE_ACCESS: &str = "access";
/// Token type claim value for refresh tokens
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Signing configuration for both token classes.
///
/// Loaded once at startup and injected into [`TokenIssuer`]; secrets are
/// immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens (must differ from access)
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Create a configuration with default lifetimes (15 minutes access,
    /// 7 days refresh).
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    /// Override token lifetimes.
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

/// JWT claims for both token classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// Issues and verifies the access/refresh token pair.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create a new issuer from signing configuration
    ///
    /// # Errors
    ///
    /// * `AuthError::TokenConfig` - a secret is empty, or both secrets
    ///   are identical
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(AuthError::TokenConfig("signing secrets must be non-empty"));
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::TokenConfig(
                "access and refresh secrets must differ",
            ));
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Issue a short-lived access token for a user
    pub fn issue_access_token(&self, user_id: UserId) -> AuthResult<String> {
        self.issue(user_id, TOKEN_TYPE_ACCESS, self.access_ttl, &self.access_encoding)
    }

    /// Issue a long-lived refresh token for a user
    pub fn issue_refresh_token(&self, user_id: UserId) -> AuthResult<String> {
        self.issue(
            user_id,
            TOKEN_TYPE_REFRESH,
            self.refresh_ttl,
            &self.refresh_encoding,
        )
    }

    fn issue(
        &self,
        user_id: UserId,
        token_type: &str,
        ttl: Duration,
        key: &EncodingKey,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.to_string(),
        };

        Ok(encode(&Header::default(), &claims, key)?)
    }

    /// Verify an access token's signature, expiry, and type
    pub fn verify_access_token(&self, token: &str) -> AuthResult<Claims> {
        Self::verify(token, TOKEN_TYPE_ACCESS, &self.access_decoding)
    }

    /// Verify a refresh token's signature, expiry, and type
    pub fn verify_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        Self::verify(token, TOKEN_TYPE_REFRESH, &self.refresh_decoding)
    }

    fn verify(token: &str, expected_type: &str, key: &DecodingKey) -> AuthResult<Claims> {
        let data = decode::<Claims>(token, key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        if data.claims.token_type != expected_type {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(
            "access_secret_for_tests_only",
            "refresh_secret_for_tests_only",
        ))
        .unwrap()
    }

    #[test]
    fn identical_secrets_rejected() {
        let err = TokenIssuer::new(TokenConfig::new("same_secret", "same_secret")).unwrap_err();
        assert!(matches!(err, AuthError::TokenConfig(_)));
    }

    #[test]
    fn empty_secret_rejected() {
        let err = TokenIssuer::new(TokenConfig::new("", "refresh")).unwrap_err();
        assert!(matches!(err, AuthError::TokenConfig(_)));
    }

    #[test]
    fn access_token_roundtrip() {
        let issuer = issuer();
        let token = issuer.issue_access_token(42).unwrap();
        let claims = issuer.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.token_type, "access");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let issuer = issuer();
        let token = issuer.issue_refresh_token(7).unwrap();
        let claims = issuer.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn token_classes_do_not_cross_verify() {
        let issuer = issuer();

        let access = issuer.issue_access_token(1).unwrap();
        assert!(matches!(
            issuer.verify_refresh_token(&access).unwrap_err(),
            AuthError::InvalidToken
        ));

        let refresh = issuer.issue_refresh_token(1).unwrap();
        assert!(matches!(
            issuer.verify_access_token(&refresh).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let config = TokenConfig::new(
            "access_secret_for_tests_only",
            "refresh_secret_for_tests_only",
        )
        // Past the default decode leeway, so expiry actually trips.
        .with_ttls(Duration::seconds(-300), Duration::seconds(-300));
        let issuer = TokenIssuer::new(config).unwrap();

        let token = issuer.issue_refresh_token(1).unwrap();
        assert!(matches!(
            issuer.verify_refresh_token(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        let issuer = issuer();
        assert!(matches!(
            issuer.verify_refresh_token("not.a.jwt").unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
