//! Session tokens issued to operators after login

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// `token_type` claim carried by portal session tokens
pub const SESSION_TOKEN_TYPE: &str = "session";

const ISSUER: &str = "roster";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Operator id
    pub sub: String,
    pub username: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    pub iss: String,
    pub token_type: String,
}

impl SessionClaims {
    pub fn new(operator_id: Uuid, username: impl Into<String>, validity: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: operator_id.to_string(),
            username: username.into(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            iss: ISSUER.to_string(),
            token_type: SESSION_TOKEN_TYPE.to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Operator id parsed back from `sub`
    pub fn operator_id(&self) -> Result<Uuid, SessionError> {
        Uuid::parse_str(&self.sub).map_err(|_| SessionError::InvalidToken)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token type: expected 'session', got '{0}'")]
    WrongTokenType(String),
}

/// Signs and verifies session tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh session token for an operator.
    pub fn issue(&self, operator_id: Uuid, username: &str) -> Result<String, SessionError> {
        let claims = SessionClaims::new(operator_id, username, self.ttl);
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    /// Verify signature, expiry and token type.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        // jsonwebtoken allows 60s of leeway on exp
        if claims.is_expired() {
            return Err(SessionError::TokenExpired);
        }

        if claims.token_type != SESSION_TOKEN_TYPE {
            return Err(SessionError::WrongTokenType(claims.token_type));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    fn signer() -> SessionSigner {
        SessionSigner::new(TEST_SECRET, Duration::hours(12))
    }

    #[test]
    fn test_issue_and_verify_session() {
        let operator_id = Uuid::new_v4();
        let token = signer().issue(operator_id, "admin").unwrap();

        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.operator_id().unwrap(), operator_id);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.token_type, SESSION_TOKEN_TYPE);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[test]
    fn test_expired_session_rejected() {
        let claims = SessionClaims::new(Uuid::new_v4(), "admin", Duration::seconds(-10));
        assert!(claims.is_expired());

        let token = signer().encode(&claims).unwrap();
        assert!(matches!(
            signer().verify(&token),
            Err(SessionError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue(Uuid::new_v4(), "admin").unwrap();
        let other = SessionSigner::new(b"another-secret", Duration::hours(1));

        assert!(matches!(other.verify(&token), Err(SessionError::Jwt(_))));
    }

    #[test]
    fn test_non_session_token_type_rejected() {
        let mut claims = SessionClaims::new(Uuid::new_v4(), "admin", Duration::hours(1));
        claims.token_type = "api".to_string();
        let token = signer().encode(&claims).unwrap();

        match signer().verify(&token) {
            Err(SessionError::WrongTokenType(t)) => assert_eq!(t, "api"),
            other => panic!("expected WrongTokenType, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_subject() {
        let mut claims = SessionClaims::new(Uuid::nil(), "admin", Duration::hours(1));
        claims.sub = "not-a-uuid".to_string();
        assert!(matches!(
            claims.operator_id(),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_claims_serialize_with_token_type() {
        let claims = SessionClaims::new(Uuid::nil(), "admin", Duration::hours(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["token_type"], "session");
        assert_eq!(json["iss"], "roster");
    }
}
