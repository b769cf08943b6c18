// src/formatting.rs

use crate::core::LogEntry;
use chrono::SecondsFormat;
use std::fmt::{self, Write};
use thiserror::Error;

/// Messages longer than this many characters are truncated in the subject.
pub const SUBJECT_MESSAGE_LIMIT: usize = 50;

const ELLIPSIS: &str = "...";

/// Errors that prevent a log entry from being turned into an email.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("field `{key}` could not be formatted")]
    Field { key: String },

    #[error("message template could not be formatted")]
    Template,
}

impl From<fmt::Error> for RenderError {
    fn from(_: fmt::Error) -> Self {
        RenderError::Template
    }
}

/// The subject and plain-text body of a notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Renders log entries into notification emails.
///
/// The renderer holds no mutable state; build it once and share it between
/// threads.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    service_name: String,
}

impl MessageRenderer {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Renders the subject and body for an entry.
    pub fn render(&self, entry: &LogEntry) -> Result<RenderedMessage, RenderError> {
        Ok(RenderedMessage {
            subject: self.subject(entry)?,
            body: self.body(entry)?,
        })
    }

    /// Formats `SERVICE[LEVEL]: MESSAGE`, truncating long messages.
    pub fn subject(&self, entry: &LogEntry) -> Result<String, RenderError> {
        let mut subject = String::new();
        write!(
            subject,
            "{}[{}]: {}",
            self.service_name,
            entry.severity,
            truncate_message(&entry.message)
        )?;
        Ok(subject)
    }

    /// Formats the body: level and message, the log time, then any fields.
    pub fn body(&self, entry: &LogEntry) -> Result<String, RenderError> {
        let mut body = String::new();
        writeln!(body, "{}: {}", entry.severity, entry.message)?;
        writeln!(body)?;
        writeln!(
            body,
            "Logged at: {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )?;

        if !entry.fields.is_empty() {
            writeln!(body)?;
            writeln!(body, "Fields:")?;
            for (key, value) in &entry.fields {
                writeln!(body, "{}: {}", key, value)
                    .map_err(|_| RenderError::Field { key: key.clone() })?;
            }
        }

        Ok(body)
    }
}

/// Keeps messages of up to 50 characters; longer ones become their first 47
/// characters followed by `...`.
fn truncate_message(message: &str) -> std::borrow::Cow<'_, str> {
    if message.chars().count() <= SUBJECT_MESSAGE_LIMIT {
        return message.into();
    }
    let keep = SUBJECT_MESSAGE_LIMIT - ELLIPSIS.len();
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Severity};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct Unprintable;

    impl fmt::Display for Unprintable {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    fn disk_entry() -> LogEntry {
        LogEntry::new(Severity::Warn, "disk usage high")
            .at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .with_field("pct", 92)
            .with_field("host", "db1")
    }

    #[test]
    fn test_render_disk_usage_example() {
        let renderer = MessageRenderer::new("billing");
        let rendered = renderer.render(&disk_entry()).unwrap();

        assert_eq!(rendered.subject, "billing[warning]: disk usage high");
        let expected_body = "warning: disk usage high\n\
                             \n\
                             Logged at: 2024-01-01T00:00:00Z\n\
                             \n\
                             Fields:\n\
                             host: db1\n\
                             pct: 92\n";
        assert_eq!(rendered.body, expected_body);
    }

    #[test]
    fn test_body_without_fields_has_no_fields_section() {
        let renderer = MessageRenderer::new("billing");
        let entry = LogEntry::new(Severity::Error, "payment gateway down")
            .at(Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap());

        let body = renderer.body(&entry).unwrap();

        assert_eq!(
            body,
            "error: payment gateway down\n\nLogged at: 2024-03-05T12:30:00Z\n"
        );
        assert!(!body.contains("Fields:"));
    }

    #[test]
    fn test_subject_keeps_message_of_exactly_fifty_chars() {
        let renderer = MessageRenderer::new("svc");
        let message = "x".repeat(50);
        let entry = LogEntry::new(Severity::Error, message.clone());

        let subject = renderer.subject(&entry).unwrap();

        assert_eq!(subject, format!("svc[error]: {}", message));
    }

    #[test]
    fn test_subject_truncates_long_message() {
        let renderer = MessageRenderer::new("svc");
        let message: String = ('a'..='z').cycle().take(60).collect();
        let entry = LogEntry::new(Severity::Error, message.clone());

        let subject = renderer.subject(&entry).unwrap();
        let portion = subject.strip_prefix("svc[error]: ").unwrap();

        assert_eq!(portion.chars().count(), 50);
        assert!(portion.ends_with("..."));
        assert_eq!(&portion[..47], &message[..47]);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let message = "é".repeat(51);
        let truncated = truncate_message(&message);

        assert_eq!(truncated.chars().count(), 50);
        assert_eq!(truncated, format!("{}...", "é".repeat(47)));
        assert_eq!(truncate_message(&"é".repeat(50)), "é".repeat(50));
    }

    #[test]
    fn test_long_message_is_not_truncated_in_body() {
        let renderer = MessageRenderer::new("svc");
        let message = "y".repeat(200);
        let entry = LogEntry::new(Severity::Warn, message.clone());

        let body = renderer.body(&entry).unwrap();

        assert!(body.starts_with(&format!("warning: {}\n", message)));
    }

    #[test]
    fn test_one_line_per_field_after_header() {
        let renderer = MessageRenderer::new("svc");
        let entry = LogEntry::new(Severity::Error, "boom")
            .with_field("b", false)
            .with_field("a", "first")
            .with_field("c", 1.5);

        let body = renderer.body(&entry).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        let header = lines.iter().position(|line| *line == "Fields:").unwrap();

        assert_eq!(&lines[header + 1..], &["a: first", "b: false", "c: 1.5"]);
        assert_eq!(lines.iter().filter(|line| **line == "Fields:").count(), 1);
    }

    #[test]
    fn test_timestamp_keeps_subsecond_precision() {
        let renderer = MessageRenderer::new("svc");
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let entry = LogEntry::new(Severity::Warn, "slow").at(timestamp);

        let body = renderer.body(&entry).unwrap();

        assert!(body.contains("Logged at: 2024-01-01T00:00:00.250Z\n"));
    }

    #[test]
    fn test_unprintable_field_is_a_render_error() {
        let renderer = MessageRenderer::new("svc");
        let entry = LogEntry::new(Severity::Error, "boom")
            .with_field("bad", FieldValue::Display(Arc::new(Unprintable)));

        let err = renderer.render(&entry).unwrap_err();

        assert_eq!(err, RenderError::Field { key: "bad".to_string() });
    }
}
