//! sendgrid-hook - email notifications for log entries
//!
//! This library provides a logging hook that renders selected log entries
//! into plain-text emails and delivers them through the SendGrid API, plus a
//! `tracing` layer that feeds it from an application's own events.

pub mod cli;
pub mod config;
pub mod core;
pub mod formatting;
pub mod notification;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
pub use formatting::{MessageRenderer, RenderError, RenderedMessage};
pub use notification::{
    Credential, DeliveryError, HookError, MailHook, MailLayer, MailMessage, MailSender,
    SendGridClient,
};
