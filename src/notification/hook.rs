//! The notification hook: gates log entries by severity and mails them.
//!
//! A hook is built once at startup and may be shared between threads. The
//! active level set sits behind a lock, so [`MailHook::set_levels`] can be
//! called while other threads are logging.
//!
//! [`MailHook::handle`] does not check the entry's severity itself; callers
//! are expected to consult [`MailHook::levels`] or [`MailHook::is_enabled`]
//! first, as [`crate::notification::MailLayer`] does.

use crate::config::Config;
use crate::core::{LogEntry, Severity};
use crate::formatting::MessageRenderer;
use crate::notification::sendgrid::{Credential, MailMessage, MailSender, SendGridClient};
use crate::notification::HookError;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A log hook that sends one email per qualifying entry.
pub struct MailHook<S: MailSender = SendGridClient> {
    sender: S,
    renderer: MessageRenderer,
    from_address: String,
    from_label: Option<String>,
    to_address: String,
    levels: RwLock<BTreeSet<Severity>>,
}

impl MailHook<SendGridClient> {
    /// Creates a hook that delivers through the public SendGrid API.
    ///
    /// The hook starts out active for warning, error, fatal and panic entries.
    pub fn new(
        credential: impl Into<Credential>,
        service_name: impl Into<String>,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Result<Self, HookError> {
        let sender = SendGridClient::new(credential)?;
        Ok(Self::with_sender(sender, service_name, from_address, to_address))
    }

    /// Creates a hook from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, HookError> {
        let sender = SendGridClient::with_endpoint(
            config.sendgrid.api_key.clone(),
            &config.sendgrid.api_url,
            Duration::from_secs(config.sendgrid.timeout_seconds),
        )?;
        let mut hook = Self::with_sender(
            sender,
            config.service_name.clone(),
            config.from_address.clone(),
            config.to_address.clone(),
        );
        if let Some(name) = &config.from_name {
            hook = hook.with_from_label(name.clone());
        }
        hook.set_levels(config.levels.iter().copied());
        Ok(hook)
    }
}

impl<S: MailSender> MailHook<S> {
    /// Creates a hook that delivers through the given sender.
    pub fn with_sender(
        sender: S,
        service_name: impl Into<String>,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Self {
        let renderer = MessageRenderer::new(service_name);
        let from_label = Some(renderer.service_name().to_string());
        Self {
            sender,
            renderer,
            from_address: from_address.into(),
            from_label,
            to_address: to_address.into(),
            levels: RwLock::new(Severity::default_levels()),
        }
    }

    /// Replaces the display name on the sender address (the service name by
    /// default).
    pub fn with_from_label(mut self, label: impl Into<String>) -> Self {
        self.from_label = Some(label.into());
        self
    }

    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Returns the levels this hook is currently active for.
    pub fn levels(&self) -> BTreeSet<Severity> {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the active level set. An empty set disables all sends.
    pub fn set_levels(&self, levels: impl IntoIterator<Item = Severity>) {
        let levels: BTreeSet<Severity> = levels.into_iter().collect();
        debug!(?levels, "Updating notification levels");
        *self.levels.write().unwrap_or_else(PoisonError::into_inner) = levels;
    }

    /// Returns true if entries of this severity should be handed to
    /// [`MailHook::handle`].
    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&severity)
    }

    /// Renders the entry and sends it as a single email.
    ///
    /// Blocks until the mail service answers. Nothing is sent if rendering
    /// fails, and a failed delivery is returned as is without retrying.
    #[instrument(skip(self, entry), fields(severity = %entry.severity))]
    pub fn handle(&self, entry: &LogEntry) -> Result<(), HookError> {
        let rendered = self.renderer.render(entry)?;

        let message = MailMessage {
            from_address: self.from_address.clone(),
            from_label: self.from_label.clone(),
            to_address: self.to_address.clone(),
            subject: rendered.subject,
            body: rendered.body,
            content_type: MailMessage::TEXT_PLAIN.to_string(),
        };

        match self.sender.send(&message) {
            Ok(()) => {
                debug!(subject = %message.subject, "Notification sent.");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Notification delivery failed");
                Err(e.into())
            }
        }
    }
}
