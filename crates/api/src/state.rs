use axum::http::HeaderMap;
use tasklane_auth::{Authenticator, SessionGuard, UserIdentity};
use tasklane_tasks::TaskStore;

use crate::{util::require_bearer, ApiError};

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    guard: SessionGuard,
    tasks: TaskStore,
}

impl AppState {
    pub fn new(authenticator: Authenticator, tasks: TaskStore) -> Self {
        Self {
            guard: authenticator.guard(),
            authenticator,
            tasks,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Resolve the caller from the `Authorization` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<UserIdentity, ApiError> {
        let token = require_bearer(headers)?;
        self.guard
            .authenticate(Some(&token))
            .map_err(ApiError::from)
    }
}
