//! Durable client-side state: the session token and display preferences.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::{ClientError, SessionContext};

const STATE_PATH_VAR: &str = "TASKLANE_CLIENT_STATE";
const STATE_FILE: &str = "client.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub theme: Theme,
}

impl ClientState {
    /// `TASKLANE_CLIENT_STATE`, else `$HOME/.config/tasklane/client.json`,
    /// else `client.json` in the working directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(STATE_PATH_VAR) {
            return PathBuf::from(path);
        }

        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home)
                .join(".config")
                .join("tasklane")
                .join(STATE_FILE),
            None => PathBuf::from(STATE_FILE),
        }
    }

    /// Read state from `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no client state yet");
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Write state to `path` through a temporary file and rename.
    pub async fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.token.clone())
    }

    pub fn sign_in(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}
