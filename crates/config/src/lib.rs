use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "tasklane.toml",
    "config/tasklane.toml",
    "crates/config/tasklane.toml",
    "../tasklane.toml",
    "../config/tasklane.toml",
];

const ENV_PREFIX: &str = "TASKLANE";
const CONFIG_PATH_VAR: &str = "TASKLANE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Origins allowed by the CORS layer. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tasklane.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for credential checks and session token signing.
///
/// ```
/// use tasklane_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.session_ttl_seconds, 86_400);
/// assert_eq!(auth.issuer, "tasklane");
/// assert!(auth.token_secret.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    /// HMAC secret for session tokens. Left empty, a random secret is
    /// generated per process and tokens do not survive a restart.
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "AuthConfig::default_issuer")]
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            token_secret: String::new(),
            issuer: Self::default_issuer(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }

    fn default_issuer() -> String {
        "tasklane".to_string()
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use tasklane_config::load;
///
/// std::env::remove_var("TASKLANE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
    load_from(explicit.as_deref())
}

/// Same as [`load`] but with an explicit configuration file taking the place
/// of the `TASKLANE_CONFIG` lookup and the default search path.
pub fn load_from(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.allowed_origins", Vec::<String>::new())?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("auth.token_secret", defaults.auth.token_secret.clone())?
        .set_default("auth.issuer", defaults.auth.issuer.clone())?;

    let mut config_file_attached = false;

    if let Some(path) = path {
        debug!(path = %path.display(), "loading configuration from explicit path");
        builder = builder.add_source(config::File::from(path.to_path_buf()));
        config_file_attached = true;
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("http.allowed_origins")
            .try_parsing(true),
    );

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    debug!(
        address = %config.http.address,
        port = config.http.port,
        database = %config.database.url,
        session_ttl = config.auth.session_ttl_seconds,
        "loaded backend configuration"
    );
    Ok(config)
}
