//! Signed, time-bound session tokens (HS256 JWT).

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tasklane_config::AuthConfig;
use tracing::warn;

use crate::AuthError;

/// Upper bound applied to configured session lifetimes (ten years).
const MAX_TTL_SECONDS: u64 = 10 * 365 * 86_400;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user public id)
    pub iat: u64,    // Issued at
    pub exp: u64,    // Expiration time
    pub iss: String, // Issuer
}

/// A freshly issued token together with the times it encodes.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl = Duration::seconds(config.session_ttl_seconds.min(MAX_TTL_SECONDS) as i64);

        if config.token_secret.is_empty() {
            warn!("auth.token_secret is not set; using a random per-process secret");
            let mut secret = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            return Self::new(&secret, config.issuer.clone(), ttl);
        }

        Self::new(config.token_secret.as_bytes(), config.issuer.clone(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str) -> Result<SessionToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let issued_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::InvalidInput("session lifetime overflows".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: unix_seconds(issued_at),
            exp: unix_seconds(expires_at),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SessionToken {
            token,
            user_id: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// Check signature, issuer and expiry. A token is expired once the
    /// current time is past its `exp` claim; no leeway is granted.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|error| {
            match error.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}
