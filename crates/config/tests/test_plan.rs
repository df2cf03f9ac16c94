//! Test plan for the `tasklane-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, environment overrides, and validation behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use tasklane_config::{load, load_from, AppConfig, AuthConfig, HttpConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "TASKLANE_CONFIG",
    "TASKLANE__AUTH__SESSION_TTL_SECONDS",
    "TASKLANE__AUTH__TOKEN_SECRET",
    "TASKLANE__AUTH__ISSUER",
    "TASKLANE__DATABASE__MAX_CONNECTIONS",
    "TASKLANE__DATABASE__URL",
    "TASKLANE__HTTP__ADDRESS",
    "TASKLANE__HTTP__PORT",
    "TASKLANE__HTTP__ALLOWED_ORIGINS",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(&path, contents).expect("failed to write config file");
    path
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.http.port, defaults.http.port);
    assert!(config.http.allowed_origins.is_empty());
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(
        config.database.max_connections,
        defaults.database.max_connections
    );
    assert_eq!(config.auth.session_ttl_seconds, defaults.auth.session_ttl_seconds);
    assert_eq!(config.auth.issuer, defaults.auth.issuer);
    assert!(config.auth.token_secret.is_empty());
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "tasklane.toml",
        r#"
        [http]
        port = 4242
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/tasklane.toml",
        r#"
        [http]
        port = 5151
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.http.port, 4242);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "tasklane.toml",
        r#"
        [http]
        port = 8181

        [auth]
        token_secret = "file-secret"
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.http.port, 8181);
    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(config.auth.token_secret, "file-secret");
    assert_eq!(config.auth.session_ttl_seconds, defaults.auth.session_ttl_seconds);
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "tasklane.toml",
        r#"
        [http]
        port = 3030
        "#,
    );

    ctx.set_var("TASKLANE__HTTP__PORT", "8080");
    ctx.set_var("TASKLANE__AUTH__SESSION_TTL_SECONDS", "3600");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.http.port, 8080);
    assert_eq!(config.auth.session_ttl_seconds, 3_600);
}

#[test]
#[serial]
fn load_splits_allowed_origins_from_environment() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var(
        "TASKLANE__HTTP__ALLOWED_ORIGINS",
        "http://localhost:5173,https://tasks.example.com",
    );

    let config = load().expect("configuration load should parse origin list");
    assert_eq!(
        config.http.allowed_origins,
        vec![
            "http://localhost:5173".to_string(),
            "https://tasks.example.com".to_string()
        ]
    );
}

#[test]
#[serial]
fn load_honours_config_path_variable() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    let path = write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
        [database]
        url = "sqlite://custom.db"
        "#,
    );
    ctx.set_var("TASKLANE_CONFIG", path.to_string_lossy());

    let config = load().expect("configuration load should read TASKLANE_CONFIG");
    assert_eq!(config.database.url, "sqlite://custom.db");
}

#[test]
#[serial]
fn load_from_explicit_path_skips_search_order() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "tasklane.toml",
        r#"
        [http]
        port = 1111
        "#,
    );
    let explicit = write_config_file(
        temp_dir.path(),
        "explicit.toml",
        r#"
        [http]
        port = 2222
        "#,
    );

    let config = load_from(Some(&explicit)).expect("explicit file should load");
    assert_eq!(config.http.port, 2222);
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "tasklane.toml",
        r#"
        [http]
        port = "not-a-number
        "#,
    );

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration") || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
fn auth_config_defaults_to_one_day_sessions() {
    let defaults = AuthConfig::default();
    assert_eq!(defaults.session_ttl_seconds, 86_400);
    assert_eq!(defaults.issuer, "tasklane");
}

#[test]
fn http_config_defaults_match_expected_host_and_port() {
    let defaults = HttpConfig::default();
    assert_eq!(defaults.address, "127.0.0.1");
    assert_eq!(defaults.port, 5000);
}
