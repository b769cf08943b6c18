//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the `sendgrid-hook`
//! binary using the `clap` crate. Arguments that override configuration are
//! merged with the `sendgrid-hook.toml` file and environment variables.

use crate::core::{FieldValue, LogEntry, Severity};
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Sends a single log notification email through SendGrid.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Severity of the notification (trace, debug, info, warning, error, fatal, panic).
    #[arg(short, long, value_name = "LEVEL", default_value = "warning")]
    pub severity: Severity,

    /// Message text of the notification.
    #[arg(short, long, value_name = "TEXT", default_value = "SendGrid Testing")]
    pub message: String,

    /// A structured field to attach, as KEY=VALUE. May be repeated.
    #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Recipient address, overriding the configured one.
    #[arg(long, value_name = "ADDR")]
    pub to: Option<String>,

    /// Print the rendered email instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Builds the log entry described by the arguments.
    pub fn entry(&self) -> LogEntry {
        self.fields.iter().fold(
            LogEntry::new(self.severity, self.message.clone()),
            |entry, (key, value)| entry.with_field(key.clone(), FieldValue::from(value.as_str())),
        )
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(to) = &self.to {
            dict.insert("to_address".into(), Value::from(to.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
