//! Configuration for the soldeck daemon.
//!
//! TOML file + `SOLDECK_` environment overrides via figment, credential
//! resolution (env + keyring + plaintext), and translation into
//! `soldeck_core` runtime types. The core crate never reads config files --
//! everything it needs is built here and handed in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use soldeck_core::{ConnectionConfig, DisplayOptions, SinkConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured (set token, token_env, or the keyring entry)")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
///
/// The `options` section reuses the core types directly -- the TOML
/// shape is the serde shape of [`DisplayOptions`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionSection,
    pub sink: SinkConfig,
    pub options: DisplayOptions,
}

/// How to reach the Home Assistant instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Instance base URL.
    pub url: String,

    /// Long-lived access token (plaintext -- prefer token_env or keyring).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed TLS certificates.
    pub insecure: bool,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            url: "http://homeassistant.local:8123".into(),
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: false,
            timeout_secs: 10,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "soldeck", "soldeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("soldeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from an explicit file path + environment.
///
/// Environment keys use `__` as the section separator, e.g.
/// `SOLDECK_CONNECTION__URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SOLDECK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the given path.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the access token from the credential chain.
pub fn resolve_token(connection: &ConnectionSection) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(ref env_name) = connection.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("soldeck", "api-token") {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = connection.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials)
}

// ── Translation to core types ───────────────────────────────────────

impl Config {
    /// Build the core connection config: parse the URL, resolve the
    /// token, and pick the TLS strategy.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let url: url::Url =
            self.connection
                .url
                .parse()
                .map_err(|e: url::ParseError| ConfigError::Validation {
                    field: "connection.url".into(),
                    reason: e.to_string(),
                })?;

        let token = resolve_token(&self.connection)?;

        let tls = if let Some(ref ca) = self.connection.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else if self.connection.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(ConnectionConfig {
            url,
            token,
            tls,
            timeout: Duration::from_secs(self.connection.timeout_secs.max(1)),
        })
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.options.clone()
    }

    pub fn sink_config(&self) -> SinkConfig {
        self.sink.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.connection.url, "http://homeassistant.local:8123");
        assert_eq!(parsed.sink.domain, "esphome");
        assert_eq!(parsed.options.pages.sample_interval_secs, 5);
        assert_eq!(parsed.options.sources.slots.len(), 12);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[connection]
url = "http://192.168.1.50:8123"
token = "abc123"

[sink]
service = "kitchen_display_update_display"

[options]
show_kw = true

[options.sources]
solar = "sensor.pv_power"

[options.pages]
enabled = [true, false, true, false, false]
switch_mode = "touch"
rotation_interval_secs = 30
"#
        )
        .unwrap();

        let cfg = load_config_from(file.path()).unwrap();
        assert_eq!(cfg.connection.url, "http://192.168.1.50:8123");
        assert_eq!(cfg.sink.service, "kitchen_display_update_display");
        assert!(cfg.options.show_kw);
        assert_eq!(cfg.options.sources.solar.as_deref(), Some("sensor.pv_power"));
        assert_eq!(
            cfg.options.pages.switch_mode,
            soldeck_core::SwitchMode::Touch
        );
        assert_eq!(cfg.options.pages.rotation_interval_secs, 30);
        // Defaults fill unspecified fields.
        assert_eq!(cfg.options.pages.sample_interval_secs, 5);
        assert_eq!(cfg.sink.domain, "esphome");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config_from(Path::new("/nonexistent/soldeck.toml")).unwrap();
        assert_eq!(cfg.connection.url, "http://homeassistant.local:8123");
    }

    #[test]
    fn plaintext_token_resolves_last() {
        let connection = ConnectionSection {
            token: Some("plain".into()),
            ..ConnectionSection::default()
        };
        use secrecy::ExposeSecret;
        let token = resolve_token(&connection).unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    fn bad_url_is_a_validation_error() {
        let cfg = Config {
            connection: ConnectionSection {
                url: "not a url".into(),
                token: Some("t".into()),
                ..ConnectionSection::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            cfg.connection_config(),
            Err(ConfigError::Validation { .. })
        ));
    }
}
