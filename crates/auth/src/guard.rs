use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::{AuthError, TokenSigner};

/// The authenticated caller attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_id: String,
}

/// Verifies session tokens on behalf of protected operations.
#[derive(Clone)]
pub struct SessionGuard {
    tokens: Arc<TokenSigner>,
}

impl SessionGuard {
    pub fn new(tokens: Arc<TokenSigner>) -> Self {
        Self { tokens }
    }

    pub fn authenticate(&self, raw: Option<&str>) -> Result<UserIdentity, AuthError> {
        let token = raw
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token).map_err(|error| {
            debug!(%error, "session token rejected");
            error
        })?;

        Ok(UserIdentity {
            user_id: claims.sub,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.map(str::trim).ok_or(AuthError::MissingToken)?;
    if value.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}
