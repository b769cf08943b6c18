use sendgrid_hook::cli::Cli;
use sendgrid_hook::config::Config;
use sendgrid_hook::Severity;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(toml_content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    file
}

fn cli_for(file: &NamedTempFile) -> Cli {
    Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    let file = write_config(
        r#"
        log_level = "debug"
        service_name = "billing"
        from_address = "alerts@example.com"
        from_name = "Billing Alerts"
        to_address = "oncall@example.com"
        levels = ["error", "fatal"]
        [sendgrid]
        api_key = "SG.from-file"
        api_url = "https://api.eu.sendgrid.com"
        timeout_seconds = 30
    "#,
    );

    let config = Config::load(&cli_for(&file)).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.service_name, "billing");
    assert_eq!(config.from_address, "alerts@example.com");
    assert_eq!(config.from_name.as_deref(), Some("Billing Alerts"));
    assert_eq!(config.to_address, "oncall@example.com");
    assert_eq!(config.levels, vec![Severity::Error, Severity::Fatal]);
    assert!(!config.sendgrid.api_key.is_empty());
    assert_eq!(config.sendgrid.api_url, "https://api.eu.sendgrid.com");
    assert_eq!(config.sendgrid.timeout_seconds, 30);
}

#[test]
#[serial]
fn test_defaults_fill_missing_sections() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
    "#,
    );

    let config = Config::load(&cli_for(&file)).unwrap();

    assert_eq!(config.log_level, "info");
    assert_eq!(config.from_name, None);
    assert_eq!(
        config.levels,
        vec![Severity::Warn, Severity::Error, Severity::Fatal, Severity::Panic]
    );
    assert_eq!(config.sendgrid.api_url, "https://api.sendgrid.com");
    assert_eq!(config.sendgrid.timeout_seconds, 10);
}

#[test]
#[serial]
fn test_warn_alias_and_empty_levels() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
        levels = ["warn"]
    "#,
    );
    let config = Config::load(&cli_for(&file)).unwrap();
    assert_eq!(config.levels, vec![Severity::Warn]);

    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
        levels = []
    "#,
    );
    let config = Config::load(&cli_for(&file)).unwrap();
    assert!(config.levels.is_empty());
}

#[test]
#[serial]
fn test_unknown_level_is_rejected() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
        levels = ["critical"]
    "#,
    );

    assert!(Config::load(&cli_for(&file)).is_err());
}

#[test]
#[serial]
fn test_missing_recipient_is_rejected() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
    "#,
    );

    let err = Config::load(&cli_for(&file)).unwrap_err();

    assert!(err.to_string().contains("to_address"), "unexpected error: {}", err);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
        [sendgrid]
        timeout_seconds = 5
    "#,
    );

    std::env::set_var("SENDGRID_API_KEY", "SG.from-env");
    std::env::set_var("SENDGRID_HOOK_SENDGRID__TIMEOUT_SECONDS", "45");
    std::env::set_var("SENDGRID_HOOK_SERVICE_NAME", "payments");

    let result = Config::load(&cli_for(&file));

    std::env::remove_var("SENDGRID_API_KEY");
    std::env::remove_var("SENDGRID_HOOK_SENDGRID__TIMEOUT_SECONDS");
    std::env::remove_var("SENDGRID_HOOK_SERVICE_NAME");

    let config = result.unwrap();
    assert!(!config.sendgrid.api_key.is_empty());
    assert_eq!(config.sendgrid.timeout_seconds, 45);
    assert_eq!(config.service_name, "payments");
}

#[test]
#[serial]
fn test_cli_recipient_overrides_file() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
    "#,
    );
    let cli = Cli {
        to: Some("escalation@example.com".to_string()),
        ..cli_for(&file)
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.to_address, "escalation@example.com");
}

#[test]
#[serial]
fn test_debug_output_redacts_api_key() {
    let file = write_config(
        r#"
        service_name = "billing"
        from_address = "alerts@example.com"
        to_address = "oncall@example.com"
        [sendgrid]
        api_key = "SG.very-secret"
    "#,
    );

    let config = Config::load(&cli_for(&file)).unwrap();

    assert!(!format!("{:?}", config).contains("very-secret"));
}
