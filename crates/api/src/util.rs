use axum::http::{header::AUTHORIZATION, HeaderMap};
use tasklane_auth::{bearer_token, AuthError};

use crate::ApiError;

pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = match headers.get(AUTHORIZATION) {
        Some(header) => Some(header.to_str().map_err(|_| AuthError::InvalidToken)?),
        None => None,
    };

    let token = bearer_token(value)?;
    Ok(token.to_string())
}
