//! Delivers log entries as email notifications.
//!
//! The [`hook::MailHook`] renders an entry and hands it to a
//! [`sendgrid::MailSender`]. The [`layer::MailLayer`] plugs the hook into a
//! `tracing` subscriber so that qualifying events are mailed as they are
//! emitted.
pub mod hook;
pub mod layer;
pub mod sendgrid;

use crate::formatting::RenderError;
use thiserror::Error;

pub use hook::MailHook;
pub use layer::MailLayer;
pub use sendgrid::{Credential, DeliveryError, MailMessage, MailSender, SendGridClient};

/// Why a log entry could not be delivered as an email.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("failed to render log entry: {0}")]
    Render(#[from] RenderError),

    #[error("failed to deliver notification: {0}")]
    Delivery(#[from] DeliveryError),
}
