use std::sync::Arc;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::{Row, SqlitePool};
use tasklane_config::AuthConfig;
use thiserror::Error;
use tracing::{debug, info};

mod guard;
mod token;
mod validation;

pub use guard::{bearer_token, SessionGuard, UserIdentity};
pub use token::{Claims, SessionToken, TokenSigner};
pub use validation::{normalize_email, validate_email, validate_password};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Hash verified when the email is unknown so both login failures cost the same.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"tasklane-dummy-password", &salt)
        .map(|hash| hash.to_string())
        .ok()
});

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("an account with this email already exists")]
    DuplicateAccount,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing session token")]
    MissingToken,
    #[error("invalid session token")]
    InvalidToken,
    #[error("session token expired")]
    ExpiredToken,
    #[error("user not found")]
    UserNotFound,
    #[error("token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub public_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            user_id: self.public_id.clone(),
        }
    }
}

/// Credential service: the only component that issues session tokens.
#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    tokens: Arc<TokenSigner>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self::with_signer(pool, TokenSigner::from_config(config))
    }

    pub fn with_signer(pool: SqlitePool, signer: TokenSigner) -> Self {
        Self {
            pool,
            tokens: Arc::new(signer),
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// A guard sharing this authenticator's signing key.
    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(Arc::clone(&self.tokens))
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        // The unique index on `email` rejects duplicates, including racing ones.
        let password_hash = hash_password(password)?;
        let now = Utc::now();
        let public_id = CUID.create_id();

        let result = sqlx::query(
            "INSERT INTO users (public_id, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(&email)
        .bind(&password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateAccount,
            other => AuthError::Database(other),
        })?;

        info!(user = %public_id, "registered user");

        Ok(User {
            id: result.last_insert_rowid(),
            public_id,
            email,
            created_at: now,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let email = normalize_email(email);

        let row = sqlx::query("SELECT public_id, password_hash FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            burn_dummy_verification(password);
            debug!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let secret: String = row.try_get("password_hash")?;
        let stored_hash = PasswordHash::new(&secret)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| {
                debug!("login rejected");
                AuthError::InvalidCredentials
            })?;

        let public_id: String = row.try_get("public_id")?;
        let session = self.tokens.issue(&public_id)?;

        info!(user = %public_id, expires_at = %session.expires_at, "issued session token");
        Ok(session)
    }

    pub async fn user_profile(&self, identity: &UserIdentity) -> Result<User, AuthError> {
        let row = sqlx::query("SELECT id, public_id, email, created_at FROM users WHERE public_id = ?")
            .bind(&identity.user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let created_at: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|error| AuthError::Database(sqlx::Error::Decode(Box::new(error))))?
            .with_timezone(&Utc);

        Ok(User {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            email: row.try_get("email")?,
            created_at,
        })
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn burn_dummy_verification(password: &str) {
    if let Some(Ok(hash)) = DUMMY_HASH.as_deref().map(PasswordHash::new) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}
