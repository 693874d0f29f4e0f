//! Configuration types for pando.
//!
//! Sources are layered, later ones winning:
//!
//! 1. the embedded defaults below
//! 2. a TOML file (`--config`, else `$XDG_CONFIG_HOME/pando/config.toml` if present)
//! 3. the legacy environment variables `PANDO_PORT`, `PANDO_CLIENT_PORT`,
//!    `PANDO_APP_NAME` and `DEBUG`
//!
//! [`Config::defaults`] returns layer 1 alone without touching the
//! filesystem or the environment (useful in tests).

use crate::error::{Error, Result};
use crate::router::RouterOptions;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[app]
name   = "Pando"
banner = true

[ingest]
bind  = "0.0.0.0:1835"
queue = 1024

[observers]
bind   = "0.0.0.0:1385"
buffer = 256

[router]
seed         = ""
auto_expand  = false
self_channel = "pando"
max_unmatched = 4096

[sink]
color  = true
theme  = "default"
buffer = 1024
"#;

/// Legacy environment variable: UDP ingestion port.
pub const ENV_PORT: &str = "PANDO_PORT";
/// Legacy environment variable: observer TCP port.
pub const ENV_CLIENT_PORT: &str = "PANDO_CLIENT_PORT";
/// Legacy environment variable: banner text.
pub const ENV_APP_NAME: &str = "PANDO_APP_NAME";
/// Legacy environment variable: comma-separated seed subscriptions.
pub const ENV_SEED: &str = "DEBUG";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub observers: ObserversConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// `[app]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Print the startup banner on stdout.
    #[serde(default = "default_true")]
    pub banner: bool,
}

fn default_app_name() -> String { "Pando".to_string() }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self { name: default_app_name(), banner: default_true() }
    }
}

/// `[ingest]` section: the UDP listener producers send to.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_bind")]
    pub bind: SocketAddr,
    /// Capacity of the dispatcher queue shared by ingest and observers.
    #[serde(default = "default_queue")]
    pub queue: usize,
}

fn default_ingest_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 1835)) }
fn default_queue() -> usize { 1024 }

impl Default for IngestConfig {
    fn default() -> Self {
        Self { bind: default_ingest_bind(), queue: default_queue() }
    }
}

/// `[observers]` section: the TCP server observers connect to.
#[derive(Debug, Clone, Deserialize)]
pub struct ObserversConfig {
    #[serde(default = "default_observers_bind")]
    pub bind: SocketAddr,
    /// Lines buffered per observer before a slow one starts losing lines.
    #[serde(default = "default_observer_buffer")]
    pub buffer: usize,
}

fn default_observers_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 1385)) }
fn default_observer_buffer() -> usize { 256 }

impl Default for ObserversConfig {
    fn default() -> Self {
        Self { bind: default_observers_bind(), buffer: default_observer_buffer() }
    }
}

/// `[router]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Comma-separated `channel[:severity]` subscriptions applied at startup.
    #[serde(default)]
    pub seed: String,
    #[serde(default)]
    pub auto_expand: bool,
    #[serde(default = "default_self_channel")]
    pub self_channel: String,
    /// Cap on remembered unmatched channels.
    #[serde(default = "default_max_unmatched")]
    pub max_unmatched: usize,
}

fn default_self_channel() -> String { crate::router::SELF_CHANNEL.to_string() }

fn default_max_unmatched() -> usize { crate::router::MAX_UNMATCHED }

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            auto_expand: false,
            self_channel: default_self_channel(),
            max_unmatched: default_max_unmatched(),
        }
    }
}

impl RouterConfig {
    pub fn options(&self) -> RouterOptions {
        RouterOptions {
            auto_expand: self.auto_expand,
            self_channel: self.self_channel.clone(),
            max_unmatched: self.max_unmatched,
        }
    }
}

/// `[sink]` section: the durable append-only output.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// File to append to. Stdout when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_sink_buffer")]
    pub buffer: usize,
}

fn default_theme() -> String { "default".to_string() }
fn default_sink_buffer() -> usize { 1024 }

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: None,
            color: default_true(),
            theme: default_theme(),
            buffer: default_sink_buffer(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load every layer, reading overrides from the process environment.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(config_path().as_path()).required(false),
        };
        let mut cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .set_override_option("app.name", env(ENV_APP_NAME))?
            .set_override_option("router.seed", env(ENV_SEED))?
            .build()?
            .try_deserialize()?;

        if let Some(port) = env(ENV_PORT) {
            cfg.ingest.bind.set_port(parse_port(ENV_PORT, &port)?);
        }
        if let Some(port) = env(ENV_CLIENT_PORT) {
            cfg.observers.bind.set_port(parse_port(ENV_CLIENT_PORT, &port)?);
        }
        tracing::debug!(ingest = %cfg.ingest.bind, observers = %cfg.observers.bind, "config loaded");
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value.trim().parse().map_err(|_| Error::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/pando/config.toml`, falling back to `~/.config`.
pub fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("pando")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
