//! Configuration management for sendgrid-hook
//!
//! This module defines the `Config` struct holding the hook's addresses,
//! service name, level set and SendGrid settings. It uses the `figment`
//! crate to layer defaults, a `sendgrid-hook.toml` file, environment
//! variables and command-line arguments.

use crate::cli::Cli;
use crate::core::Severity;
use crate::notification::sendgrid::{Credential, DEFAULT_API_URL};
use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The file read when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sendgrid-hook.toml";

/// The main configuration struct for the hook.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the binary's own diagnostics.
    pub log_level: String,
    /// Label prefixed to every subject line.
    pub service_name: String,
    /// Sender address of every notification.
    pub from_address: String,
    /// Display name of the sender. Defaults to the service name.
    #[serde(default)]
    pub from_name: Option<String>,
    /// Recipient address of every notification.
    pub to_address: String,
    /// Severities that trigger an email.
    pub levels: Vec<Severity>,
    /// Settings for the SendGrid API.
    pub sendgrid: SendGridConfig,
}

/// Settings for the SendGrid API.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SendGridConfig {
    /// The API key, also read from `SENDGRID_API_KEY`.
    #[serde(default)]
    pub api_key: Credential,
    /// Base URL of the API.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads configuration by layering defaults, the TOML file, environment
    /// variables and command-line arguments, in increasing precedence.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. SENDGRID_HOOK_SENDGRID__TIMEOUT_SECONDS=30
            .merge(Env::prefixed("SENDGRID_HOOK_").split("__"))
            .merge(Env::raw().only(&["SENDGRID_API_KEY"]).map(|_| "sendgrid.api_key".into()))
            .merge(cli)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings every notification depends on.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.service_name.trim().is_empty(), "service_name must not be empty");
        ensure!(!self.from_address.trim().is_empty(), "from_address must not be empty");
        ensure!(!self.to_address.trim().is_empty(), "to_address must not be empty");
        ensure!(
            self.sendgrid.timeout_seconds > 0,
            "sendgrid.timeout_seconds must be greater than zero"
        );
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            service_name: "sendgrid-hook".to_string(),
            from_address: String::new(),
            from_name: None,
            to_address: String::new(),
            levels: Severity::default_levels().into_iter().collect(),
            sendgrid: SendGridConfig {
                api_key: Credential::default(),
                api_url: DEFAULT_API_URL.to_string(),
                timeout_seconds: 10,
            },
        }
    }
}
