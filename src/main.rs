//! sendgrid-hook - send a log notification email through SendGrid
//!
//! Loads the hook configuration, builds a single log entry from the
//! command-line arguments and delivers it exactly as the hook would for an
//! entry emitted by the application.

use anyhow::{Context, Result};
use clap::Parser;
use sendgrid_hook::{cli::Cli, config::Config, notification::MailHook};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        init_logging("info");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    init_logging(&config.log_level);

    if let Err(err) = run(&cli, &config) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    info!("-------------------- Configuration --------------------");
    info!("Service Name: {}", config.service_name);
    info!("From: {}", config.from_address);
    info!("To: {}", config.to_address);
    info!("SendGrid URL: {}", config.sendgrid.api_url);
    info!("SendGrid Timeout: {}s", config.sendgrid.timeout_seconds);
    info!("-------------------------------------------------------");

    let hook = MailHook::from_config(config).context("failed to create SendGrid hook")?;
    let entry = cli.entry();

    if cli.dry_run {
        let rendered = hook.renderer().render(&entry)?;
        println!("Subject: {}\n\n{}", rendered.subject, rendered.body);
        return Ok(());
    }

    if !hook.is_enabled(entry.severity) {
        info!(
            severity = %entry.severity,
            "Severity is not in the configured levels; nothing to send."
        );
        return Ok(());
    }

    hook.handle(&entry).context("failed to send notification")?;
    info!("Email sent!");
    Ok(())
}
