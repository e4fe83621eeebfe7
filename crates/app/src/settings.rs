//! Settings of the `bank` binary.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by environment variables such as `BANK__DATABASE__URL` or
//! `BANK__SERVER__PORT`. Every key has a default, but the server refuses to
//! start without `server.cert_path` and `server.key_path` unless
//! `server.insecure_http` is set.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level applied to the workspace crates.
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite:./bank.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: IpAddr,
    pub port: u16,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// Serve plain HTTP when no certificate is configured. Local development
    /// only.
    pub insecure_http: bool,
    pub timeout_secs: u64,
    pub stream_timeout_secs: u64,
}

impl Default for Server {
    fn default() -> Self {
        let defaults = server::ServerConfig::default();
        Self {
            bind: defaults.bind,
            port: defaults.port,
            cert_path: None,
            key_path: None,
            insecure_http: false,
            timeout_secs: defaults.timeouts.standard.as_secs(),
            stream_timeout_secs: defaults.timeouts.stream.as_secs(),
        }
    }
}

impl Server {
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.cert_path, &self.key_path) {
            (Some(_), Some(_)) => Ok(()),
            (None, None) if self.insecure_http => Ok(()),
            (None, None) => Err(ConfigError::Message(
                "server.cert_path and server.key_path are required unless server.insecure_http is set"
                    .to_string(),
            )),
            _ => Err(ConfigError::Message(
                "server.cert_path and server.key_path must be set together".to_string(),
            )),
        }
    }

    pub fn to_config(&self) -> server::ServerConfig {
        let tls = match (&self.cert_path, &self.key_path) {
            (Some(cert_path), Some(key_path)) => Some(server::TlsFiles {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };
        server::ServerConfig {
            bind: self.bind,
            port: self.port,
            tls,
            timeouts: server::Timeouts {
                standard: Duration::from_secs(self.timeout_secs),
                stream: Duration::from_secs(self.stream_timeout_secs),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub enabled: bool,
    pub signup_secs: u64,
    pub account_sweep_secs: u64,
    pub withdraw_sweep_secs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        let defaults = scheduler::Intervals::default();
        Self {
            enabled: true,
            signup_secs: defaults.signup.as_secs(),
            account_sweep_secs: defaults.account_sweep.as_secs(),
            withdraw_sweep_secs: defaults.withdraw_sweep.as_secs(),
        }
    }
}

impl Scheduler {
    pub fn intervals(&self) -> scheduler::Intervals {
        scheduler::Intervals {
            signup: Duration::from_secs(self.signup_secs),
            account_sweep: Duration::from_secs(self.account_sweep_secs),
            withdraw_sweep: Duration::from_secs(self.withdraw_sweep_secs),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Server,
    pub scheduler: Scheduler,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("BANK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("server.timeout_secs", self.server.timeout_secs),
            ("server.stream_timeout_secs", self.server.stream_timeout_secs),
            ("scheduler.signup_secs", self.scheduler.signup_secs),
            ("scheduler.account_sweep_secs", self.scheduler.account_sweep_secs),
            ("scheduler.withdraw_sweep_secs", self.scheduler.withdraw_sweep_secs),
        ];
        if let Some((key, _)) = periods.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Message(format!("{key} must be > 0")));
        }
        self.server.validate()
    }
}
