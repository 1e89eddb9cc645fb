use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::common::range::DelayRange;

pub const DEFAULT_PORT: u16 = 5558;
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted frame body, in bytes.
    pub max_frame_len: usize,
    /// A connected peer that sends nothing for this long is dropped; 0
    /// waits forever.
    pub idle_timeout_ms: u64,
    /// A reply the peer does not take within this long drops the peer; 0
    /// waits forever.
    pub write_timeout_ms: u64,
    /// Fixed generator seed; OS entropy when unset.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            idle_timeout_ms: 30_000,
            write_timeout_ms: 5_000,
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    /// Applies a `host:port` override such as the one given with `--bind`.
    pub fn override_bind(&mut self, bind: &str) -> Result<()> {
        let (host, port) = bind
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("bind address must be host:port, got {}", bind))?;
        self.port = port
            .parse()
            .with_context(|| format!("invalid port in bind address {}", bind))?;
        self.host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub server_addr: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Ranges replayed by the demo client.
    #[serde(default = "default_demo_ranges")]
    pub ranges: Vec<DelayRange>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            ranges: default_demo_ranges(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_demo_ranges() -> Vec<DelayRange> {
    [(0.5, 2.0), (1.0, 3.0), (0.1, 1.0)]
        .into_iter()
        .filter_map(|(min, max)| DelayRange::new(min, max).ok())
        .collect()
}

/// Loads the server configuration: defaults, then the optional file at
/// `path`, then `DELAY_SERVER_*` environment variables.
pub fn load_server_config(path: Option<&str>) -> Result<ServerConfig> {
    dotenv::dotenv().ok();
    let defaults = ServerConfig::default();
    let mut builder = Config::builder()
        .set_default("host", defaults.host)?
        .set_default("port", defaults.port as i64)?
        .set_default("max_frame_len", defaults.max_frame_len as i64)?
        .set_default("idle_timeout_ms", defaults.idle_timeout_ms as i64)?
        .set_default("write_timeout_ms", defaults.write_timeout_ms as i64)?;
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }
    let settings = builder
        .add_source(Environment::with_prefix("DELAY_SERVER").try_parsing(true))
        .build()
        .context("failed to build server configuration")?;
    let config = settings
        .try_deserialize()
        .context("invalid server configuration")?;
    Ok(config)
}

/// Loads the client configuration: defaults, then the optional file at
/// `path`, then `DELAY_CLIENT_*` environment variables.
pub fn load_client_config(path: Option<&str>) -> Result<ClientConfig> {
    dotenv::dotenv().ok();
    let defaults = ClientConfig::default();
    let mut builder = Config::builder()
        .set_default("server_addr", defaults.server_addr)?
        .set_default("connect_timeout_ms", defaults.connect_timeout_ms as i64)?
        .set_default("request_timeout_ms", defaults.request_timeout_ms as i64)?;
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }
    let settings = builder
        .add_source(Environment::with_prefix("DELAY_CLIENT").try_parsing(true))
        .build()
        .context("failed to build client configuration")?;
    let config = settings
        .try_deserialize()
        .context("invalid client configuration")?;
    Ok(config)
}
